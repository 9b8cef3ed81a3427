//! In-memory storage adapter
//!
//! The embeddable default store, and the double every non-database test
//! runs against. Commit order per owner is the insertion order of the
//! owner's index vector; the conditional-commit check makes lost updates
//! impossible even if a caller bypasses the ledger's owner lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use core_kernel::{EntryId, OwnerRef};

use crate::entry::LedgerEntry;
use crate::error::StoreError;
use crate::store::{
    EntryStore, HeadSnapshot, HistoryPage, PageRequest, PageToken, TimeRange,
};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<EntryId, LedgerEntry>,
    /// Per-owner entry ids in commit order
    by_owner: HashMap<OwnerRef, Vec<EntryId>>,
    /// original entry id -> compensating entry id
    compensations: HashMap<EntryId, EntryId>,
}

impl Inner {
    fn head_id(&self, owner: &OwnerRef) -> Option<EntryId> {
        self.by_owner.get(owner).and_then(|ids| ids.last().copied())
    }

    fn check_head(&self, owner: &OwnerRef, expected: Option<EntryId>) -> Result<(), StoreError> {
        if self.head_id(owner) != expected {
            return Err(StoreError::CommitConflict {
                owner: owner.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, entry: LedgerEntry) {
        self.by_owner
            .entry(entry.owner.clone())
            .or_default()
            .push(entry.id);
        self.entries.insert(entry.id, entry);
    }

    fn owner_entries<'a>(
        &'a self,
        owner: &OwnerRef,
    ) -> impl DoubleEndedIterator<Item = &'a LedgerEntry> {
        self.by_owner
            .get(owner)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id))
    }
}

/// In-memory `EntryStore` implementation
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    inner: RwLock<Inner>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn head(&self, owner: &OwnerRef) -> Result<Option<HeadSnapshot>, StoreError> {
        let inner = self.inner.read().await;
        let head = inner.head_id(owner).and_then(|id| inner.entries.get(&id));
        Ok(head.map(|entry| HeadSnapshot {
            entry_id: entry.id,
            running_balance: entry.running_balance,
            created_at: entry.created_at,
        }))
    }

    async fn commit(
        &self,
        entry: &LedgerEntry,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_head(&entry.owner, expected_head)?;
        inner.insert(entry.clone());
        Ok(())
    }

    async fn commit_reversal(
        &self,
        compensation: &LedgerEntry,
        original: EntryId,
        reversed_at: DateTime<Utc>,
        expected_head: Option<EntryId>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_head(&compensation.owner, expected_head)?;

        let target = inner
            .entries
            .get_mut(&original)
            .ok_or_else(|| StoreError::NotFound(original.to_string()))?;
        if target.reversed_at.is_some() {
            // Lost the race to another reversal; the caller re-reads and
            // resolves idempotently.
            return Err(StoreError::CommitConflict {
                owner: compensation.owner.to_string(),
            });
        }
        target.reversed_at = Some(reversed_at);

        inner.compensations.insert(original, compensation.id);
        inner.insert(compensation.clone());
        Ok(())
    }

    async fn get(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self.inner.read().await.entries.get(&id).cloned())
    }

    async fn find_compensation(
        &self,
        original: EntryId,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .compensations
            .get(&original)
            .and_then(|id| inner.entries.get(id))
            .cloned())
    }

    async fn latest_unvoided(&self, owner: &OwnerRef) -> Result<Option<LedgerEntry>, StoreError> {
        let inner = self.inner.read().await;
        let latest = inner
            .owner_entries(owner)
            .filter(|e| !e.is_voided())
            .next_back()
            .cloned();
        Ok(latest)
    }

    async fn latest_unvoided_as_of(
        &self,
        owner: &OwnerRef,
        at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        let inner = self.inner.read().await;
        let latest = inner
            .owner_entries(owner)
            .filter(|e| e.created_at <= at && !e.is_voided_as_of(at))
            .next_back()
            .cloned();
        Ok(latest)
    }

    async fn history(
        &self,
        owner: &OwnerRef,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<HistoryPage, StoreError> {
        let inner = self.inner.read().await;

        let after = page.token;
        let mut matched = inner
            .owner_entries(owner)
            .filter(|e| range.contains(e.created_at))
            .filter(|e| match after {
                Some(token) => (e.created_at, e.id) > (token.created_at, token.id),
                None => true,
            });

        let entries: Vec<LedgerEntry> = matched.by_ref().take(page.limit).cloned().collect();
        let next_token = if matched.next().is_some() {
            entries.last().map(PageToken::after)
        } else {
            None
        };

        Ok(HistoryPage {
            entries,
            next_token,
        })
    }

    async fn audit_trail(&self, owner: &OwnerRef) -> Result<Vec<LedgerEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.owner_entries(owner).cloned().collect())
    }
}
