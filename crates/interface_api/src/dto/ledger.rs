//! Ledger DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::MAX_SCALE;
use domain_ledger::{AuditRecord, EntryType, LedgerEntry, Metadata};

#[derive(Debug, Deserialize, Validate)]
pub struct AppendEntryRequest {
    #[validate(length(min = 1, max = 64))]
    pub owner_kind: String,
    #[validate(length(min = 1, max = 128))]
    pub owner_id: String,
    /// Signed movement value, already at the declared scale
    pub amount: Decimal,
    /// Fractional digits of the owner's sequence
    #[validate(range(max = MAX_SCALE))]
    pub scale: u32,
    pub entry_type: EntryType,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Opaque attachment, stored verbatim
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReverseEntryRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Point-in-time balance; current balance when absent
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Resume cursor from a previous page's `next_token`
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub owner_kind: String,
    pub owner_id: String,
    pub amount: Decimal,
    pub scale: u32,
    pub running_balance: Decimal,
    pub entry_type: EntryType,
    pub description: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub reversed_at: Option<DateTime<Utc>>,
    pub reversal_of: Option<String>,
}

impl From<LedgerEntry> for EntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            owner_kind: entry.owner.kind,
            owner_id: entry.owner.id,
            amount: entry.amount.value(),
            scale: entry.amount.scale(),
            running_balance: entry.running_balance.value(),
            entry_type: entry.entry_type,
            description: entry.description,
            metadata: entry.metadata,
            created_at: entry.created_at,
            reversed_at: entry.reversed_at,
            reversal_of: entry.reversal_of.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReversalResponse {
    /// True when the entry had already been reversed and the existing
    /// compensation is returned instead of a new one
    pub already_reversed: bool,
    pub entry: EntryResponse,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub owner_kind: String,
    pub owner_id: String,
    pub balance: Decimal,
    pub scale: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<EntryResponse>,
    /// Pass back as `token` to fetch the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditRecordResponse {
    #[serde(flatten)]
    pub entry: EntryResponse,
    pub voided: bool,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(record: AuditRecord) -> Self {
        Self {
            voided: record.voided,
            entry: record.entry.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditExportResponse {
    pub owner_kind: String,
    pub owner_id: String,
    pub records: Vec<AuditRecordResponse>,
}
