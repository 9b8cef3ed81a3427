//! Read-only query facade
//!
//! Never writes and never takes the owner append lock; reads observe
//! committed state only, possibly slightly stale under concurrent
//! writers, but always internally consistent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use core_kernel::{Amount, OwnerRef};

use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::store::{EntryStore, HistoryPage, PageRequest, TimeRange};

/// One row of an audit export: the entry plus an explicit voided flag
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub voided: bool,
}

/// Read-only facade over the entry store
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntryStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// The owner's current balance: the stored running balance of the
    /// most recent entry that is not voided, or zero when the owner has
    /// no entries
    pub async fn current_balance(&self, owner: &OwnerRef) -> Result<Amount, LedgerError> {
        let latest = self.store.latest_unvoided(owner).await?;
        Ok(latest.map(|e| e.running_balance).unwrap_or(Amount::zero(0)))
    }

    /// The owner's balance as it stood at `at`: the stored running
    /// balance of the latest entry committed by then, ignoring entries
    /// that had already been voided at that instant (a reversal that
    /// happened later does not rewrite the past)
    pub async fn balance_as_of(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Amount, LedgerError> {
        let latest = self.store.latest_unvoided_as_of(owner, at).await?;
        Ok(latest.map(|e| e.running_balance).unwrap_or(Amount::zero(0)))
    }

    /// One page of the owner's entries within `range`, in commit order.
    /// Voided entries and their compensations are always included;
    /// history never hides data.
    pub async fn history(
        &self,
        owner: &OwnerRef,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<HistoryPage, LedgerError> {
        Ok(self.store.history(owner, range, page).await?)
    }

    /// Every entry ever committed for the owner with explicit voided
    /// flags, for compliance and reporting collaborators
    pub async fn audit_export(&self, owner: &OwnerRef) -> Result<Vec<AuditRecord>, LedgerError> {
        let entries = self.store.audit_trail(owner).await?;
        Ok(entries
            .into_iter()
            .map(|entry| AuditRecord {
                voided: entry.is_voided(),
                entry,
            })
            .collect())
    }

    /// Fetches one entry by id
    pub async fn get(&self, id: core_kernel::EntryId) -> Result<LedgerEntry, LedgerError> {
        self.store.get(id).await?.ok_or(LedgerError::NotFound(id))
    }
}
