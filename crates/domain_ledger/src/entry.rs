//! Ledger entries and entry drafts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{Amount, EntryId, OwnerRef};

/// Opaque key/value attachment supplied by the producing collaborator.
/// The ledger stores it verbatim and never interprets its contents.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Semantic category of a movement
///
/// Informational only: the tag never changes arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Value charged against the owner
    Charge,
    /// Value returned to the owner
    Refund,
    /// Manual correction
    Adjustment,
    /// Accrued credit (loyalty points, referral rewards)
    Accrual,
    /// Compensating entry posted by the reversal handler
    Reversal,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Charge => "charge",
            EntryType::Refund => "refund",
            EntryType::Adjustment => "adjustment",
            EntryType::Accrual => "accrual",
            EntryType::Reversal => "reversal",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge" => Ok(EntryType::Charge),
            "refund" => Ok(EntryType::Refund),
            "adjustment" => Ok(EntryType::Adjustment),
            "accrual" => Ok(EntryType::Accrual),
            "reversal" => Ok(EntryType::Reversal),
            other => Err(format!("unknown entry type '{other}'")),
        }
    }
}

/// One immutable signed movement recorded against an owner
///
/// # Invariants
///
/// - `amount`, `owner`, `created_at` and `running_balance` never change
///   after commit
/// - `running_balance` equals the previous committed entry's running
///   balance plus this entry's `amount`
/// - reversal never edits an entry's amounts; it only sets `reversed_at`
///   while appending a compensating entry that points back via
///   `reversal_of`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Globally unique identifier, assigned at creation
    pub id: EntryId,
    /// The entity this movement is recorded against
    pub owner: OwnerRef,
    /// Signed movement value
    pub amount: Amount,
    /// Stored snapshot of the owner's balance after this entry
    pub running_balance: Amount,
    /// Semantic category
    pub entry_type: EntryType,
    /// Optional human-readable text
    pub description: Option<String>,
    /// Opaque collaborator-supplied attachment
    pub metadata: Metadata,
    /// Commit timestamp, non-decreasing within an owner's sequence
    pub created_at: DateTime<Utc>,
    /// Set when this entry has been logically voided
    pub reversed_at: Option<DateTime<Utc>>,
    /// For compensating entries, the entry this one cancels
    pub reversal_of: Option<EntryId>,
}

impl LedgerEntry {
    /// Returns true if this entry has been logically voided
    pub fn is_voided(&self) -> bool {
        self.reversed_at.is_some()
    }

    /// Returns true if this entry was already voided at the given instant
    pub fn is_voided_as_of(&self, at: DateTime<Utc>) -> bool {
        matches!(self.reversed_at, Some(reversed_at) if reversed_at <= at)
    }

    /// Returns true if this entry is a compensating entry
    pub fn is_compensation(&self) -> bool {
        self.reversal_of.is_some()
    }
}

/// A proposed entry, before validation and commit
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub owner: OwnerRef,
    pub amount: Amount,
    pub entry_type: EntryType,
    pub description: Option<String>,
    pub metadata: Metadata,
}

impl EntryDraft {
    /// Creates a draft with no description or metadata
    pub fn new(owner: OwnerRef, amount: Amount, entry_type: EntryType) -> Self {
        Self {
            owner,
            amount,
            entry_type,
            description: None,
            metadata: Metadata::new(),
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches collaborator metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
