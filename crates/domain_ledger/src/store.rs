//! Storage port for ledger entries
//!
//! The ledger sits atop a durable transactional row store. This module
//! defines the port trait adapters implement (in-memory here, PostgreSQL
//! in `infra_db`), along with the paging and range types read paths use.
//!
//! Adapters must provide two atomic primitives beyond plain reads:
//! a *conditional commit* keyed on the owner's current head entry, and a
//! *reversal commit* that inserts the compensating entry and flags the
//! original in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use core_kernel::{Amount, EntryId, OwnerRef};

use crate::entry::LedgerEntry;
use crate::error::StoreError;

/// Default page size for history queries
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// The last committed entry for an owner, as seen at the start of an
/// append's critical section
#[derive(Debug, Clone)]
pub struct HeadSnapshot {
    pub entry_id: EntryId,
    pub running_balance: Amount,
    pub created_at: DateTime<Utc>,
}

/// Half-open time filter for history queries; both bounds inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Unbounded range
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// Opaque resume cursor for history pagination
///
/// Encodes the `(created_at, id)` position of the last entry already
/// returned; the next page starts strictly after it in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub created_at: DateTime<Utc>,
    pub id: EntryId,
}

impl PageToken {
    pub fn after(entry: &LedgerEntry) -> Self {
        Self {
            created_at: entry.created_at,
            id: entry.id,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Malformed page token: {0}")]
pub struct PageTokenError(String);

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.created_at.to_rfc3339(), self.id)
    }
}

impl FromStr for PageToken {
    type Err = PageTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts, id) = s
            .rsplit_once('~')
            .ok_or_else(|| PageTokenError(s.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| PageTokenError(e.to_string()))?
            .with_timezone(&Utc);
        let id = id.parse().map_err(|_| PageTokenError(id.to_string()))?;
        Ok(Self { created_at, id })
    }
}

/// A page request: resume cursor plus page size
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub token: Option<PageToken>,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            token: None,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { token: None, limit }
    }

    pub fn resume(token: PageToken, limit: usize) -> Self {
        Self {
            token: Some(token),
            limit,
        }
    }
}

/// One page of history, in commit order
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub entries: Vec<LedgerEntry>,
    /// Present when more entries remain past this page
    pub next_token: Option<PageToken>,
}

/// Port trait for durable entry storage
///
/// Implementations must never mutate a committed entry except for the
/// single `reversed_at` flag update performed by `commit_reversal`.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Returns the owner's most recently committed entry, voided or not
    async fn head(&self, owner: &OwnerRef) -> Result<Option<HeadSnapshot>, StoreError>;

    /// Durably appends `entry` if the owner's head still equals
    /// `expected_head`
    ///
    /// # Errors
    ///
    /// `CommitConflict` when another writer committed first.
    async fn commit(
        &self,
        entry: &LedgerEntry,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError>;

    /// Atomically appends the compensating entry and sets `reversed_at`
    /// on the original; both succeed or neither does
    ///
    /// # Errors
    ///
    /// `CommitConflict` when the head moved or the original is already
    /// flagged.
    async fn commit_reversal(
        &self,
        compensation: &LedgerEntry,
        original: EntryId,
        reversed_at: DateTime<Utc>,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError>;

    /// Fetches one entry by id
    async fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Finds the compensating entry that voided `original`, if any
    async fn find_compensation(&self, original: EntryId)
        -> Result<Option<LedgerEntry>, StoreError>;

    /// The most recent entry for the owner that is not currently voided
    async fn latest_unvoided(&self, owner: &OwnerRef) -> Result<Option<LedgerEntry>, StoreError>;

    /// The latest entry with `created_at <= at` that was not yet voided
    /// at `at` (entries reversed after `at` still count)
    async fn latest_unvoided_as_of(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>, StoreError>;

    /// One page of the owner's entries within `range`, in commit order,
    /// voided entries and compensations included
    async fn history(
        &self,
        owner: &OwnerRef,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<HistoryPage, StoreError>;

    /// Every entry ever committed for the owner, in commit order
    async fn audit_trail(&self, owner: &OwnerRef) -> Result<Vec<LedgerEntry>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_token_round_trip() {
        let token = PageToken {
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
            id: EntryId::new_v7(),
        };
        let parsed: PageToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_page_token_rejects_garbage() {
        assert!("not-a-token".parse::<PageToken>().is_err());
        assert!("2024-06-01T12:30:00Z~not-an-id".parse::<PageToken>().is_err());
    }

    #[test]
    fn test_time_range_contains() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();

        let range = TimeRange::between(from, to);
        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(to + chrono::Duration::seconds(1)));

        assert!(TimeRange::all().contains(from));
        assert!(!TimeRange::since(to).contains(from));
    }
}
