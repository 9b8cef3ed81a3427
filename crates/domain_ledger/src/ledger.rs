//! The ledger service: validated, serialized appends and compensating
//! reversals
//!
//! The append path for one owner is a critical section: read the head,
//! validate, compute the next running balance, commit. Serialization is
//! enforced twice over. A per-owner async mutex (bounded wait, surfacing
//! `OwnerLockTimeout`) serializes writers in this process, and every
//! commit is conditional on the head entry observed at the start of the
//! section, so the sequencing invariant holds even when several processes
//! share one store. Conflicting commits are retried up to a bounded
//! attempt count, then surfaced as `CommitConflict`.
//!
//! Reversal never mutates history: it appends a compensating entry with
//! the negated amount through the same append path, and the store flags
//! the original in the same transaction. Reversing an already-reversed
//! entry returns the existing compensation instead of creating another.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use core_kernel::{Amount, EntryId, OwnerRef};

use crate::balance::next_balance;
use crate::entry::{EntryDraft, EntryType, LedgerEntry, Metadata};
use crate::error::{LedgerError, StoreError};
use crate::store::EntryStore;
use crate::validate::{self, OwnerPolicy};

/// Engine-level configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Bounded wait for an owner's append section
    pub lock_wait: Duration,
    /// Conditional-commit attempts before surfacing `CommitConflict`
    pub max_commit_attempts: u32,
    /// Whether a compensating entry may itself be reversed
    pub allow_chained_reversal: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(5),
            max_commit_attempts: 4,
            allow_chained_reversal: false,
        }
    }
}

/// Result of a reversal request
///
/// Reversing an already-reversed entry is a no-op that reports the
/// existing compensation; it is an outcome, not an error.
#[derive(Debug, Clone)]
pub enum ReversalOutcome {
    /// A new compensating entry was committed
    Created(LedgerEntry),
    /// The entry was already reversed; this is the prior compensation
    AlreadyReversed(LedgerEntry),
}

impl ReversalOutcome {
    /// The compensating entry, whether new or pre-existing
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            ReversalOutcome::Created(entry) | ReversalOutcome::AlreadyReversed(entry) => entry,
        }
    }

    pub fn into_entry(self) -> LedgerEntry {
        match self {
            ReversalOutcome::Created(entry) | ReversalOutcome::AlreadyReversed(entry) => entry,
        }
    }

    /// True when the request found the reversal already done
    pub fn was_noop(&self) -> bool {
        matches!(self, ReversalOutcome::AlreadyReversed(_))
    }
}

/// The ledger engine
pub struct Ledger {
    store: Arc<dyn EntryStore>,
    config: LedgerConfig,
    owner_locks: StdMutex<HashMap<OwnerRef, Arc<AsyncMutex<()>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn EntryStore>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            owner_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the underlying store (for read-only facades)
    pub fn store(&self) -> Arc<dyn EntryStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validates and commits a movement against its owner's sequence
    ///
    /// # Errors
    ///
    /// - `Validation` for structural or policy rejections; nothing is
    ///   committed
    /// - `OwnerLockTimeout` when the append section stayed busy past the
    ///   configured wait (retryable)
    /// - `CommitConflict` when conditional commits kept losing races
    ///   (retryable)
    /// - `Storage` for durable-write failures
    pub async fn append(
        &self,
        draft: EntryDraft,
        policy: &OwnerPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        validate::validate_draft(&draft)?;

        let _section = self.lock_owner(&draft.owner).await?;
        self.append_in_section(draft, policy, None).await
    }

    /// Voids an entry by appending a compensating entry with the negated
    /// amount, atomically flagging the original
    ///
    /// # Errors
    ///
    /// - `NotFound` when no such entry exists
    /// - `ChainedReversalForbidden` when the target is itself a
    ///   compensation and chained reversal is disabled
    /// - lock/commit/storage errors as for `append`; the operation is
    ///   safe to retry, and retrying a completed reversal is a no-op
    pub async fn reverse(
        &self,
        entry_id: EntryId,
        reason: impl Into<String>,
    ) -> Result<ReversalOutcome, LedgerError> {
        let reason = reason.into();

        let original = self
            .store
            .get(entry_id)
            .await?
            .ok_or(LedgerError::NotFound(entry_id))?;

        if original.entry_type == EntryType::Reversal && !self.config.allow_chained_reversal {
            return Err(LedgerError::ChainedReversalForbidden(entry_id));
        }

        let _section = self.lock_owner(&original.owner).await?;

        // Re-read under the lock: another caller may have completed the
        // reversal while we waited.
        let original = self
            .store
            .get(entry_id)
            .await?
            .ok_or(LedgerError::NotFound(entry_id))?;
        if original.is_voided() {
            let compensation = self
                .store
                .find_compensation(entry_id)
                .await?
                .ok_or_else(|| {
                    StoreError::corrupt(format!(
                        "entry {entry_id} is flagged reversed but has no compensation"
                    ))
                })?;
            debug!(entry = %entry_id, compensation = %compensation.id, "reversal already done");
            return Ok(ReversalOutcome::AlreadyReversed(compensation));
        }

        let mut metadata = Metadata::new();
        metadata.insert(
            "reversed_entry".to_string(),
            serde_json::Value::String(original.id.to_string()),
        );
        let draft = EntryDraft {
            owner: original.owner.clone(),
            amount: -original.amount,
            entry_type: EntryType::Reversal,
            description: Some(reason),
            metadata,
        };

        // Compensations are exempt from the negative-balance policy: a
        // void must always be recordable.
        let entry = self
            .append_in_section(draft, &OwnerPolicy::default(), Some(original.id))
            .await?;
        Ok(ReversalOutcome::Created(entry))
    }

    /// Fetches one entry by id
    pub async fn get(&self, entry_id: EntryId) -> Result<LedgerEntry, LedgerError> {
        self.store
            .get(entry_id)
            .await?
            .ok_or(LedgerError::NotFound(entry_id))
    }

    /// Acquires the owner's append section with a bounded wait
    async fn lock_owner(
        &self,
        owner: &OwnerRef,
    ) -> Result<tokio::sync::OwnedMutexGuard<()>, LedgerError> {
        let lock = {
            let mut locks = self
                .owner_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(owner.clone()).or_default())
        };

        match timeout(self.config.lock_wait, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(owner = %owner, wait_ms = self.config.lock_wait.as_millis() as u64,
                    "owner append section stayed busy");
                Err(LedgerError::OwnerLockTimeout {
                    owner: owner.to_string(),
                    waited_ms: self.config.lock_wait.as_millis() as u64,
                })
            }
        }
    }

    /// The owner critical section: read head, validate, compute, commit.
    /// Caller holds the owner lock. `reversal_of` routes the commit
    /// through the store's atomic flag-plus-compensation primitive.
    async fn append_in_section(
        &self,
        draft: EntryDraft,
        policy: &OwnerPolicy,
        reversal_of: Option<EntryId>,
    ) -> Result<LedgerEntry, LedgerError> {
        let attempts = self.config.max_commit_attempts.max(1);

        for attempt in 1..=attempts {
            let head = self.store.head(&draft.owner).await?;

            validate::check_scale(&draft.amount, head.as_ref())?;
            let prior = match &head {
                Some(head) => head.running_balance,
                None => Amount::zero(draft.amount.scale()),
            };
            let running_balance = next_balance(&prior, &draft.amount)?;
            if reversal_of.is_none() {
                validate::check_balance_policy(policy, &prior, &draft.amount, &running_balance)?;
            }

            // Commit timestamps never go backwards within an owner.
            let mut created_at = Utc::now();
            if let Some(head) = &head {
                created_at = created_at.max(head.created_at);
            }

            let entry = LedgerEntry {
                id: EntryId::new_v7(),
                owner: draft.owner.clone(),
                amount: draft.amount,
                running_balance,
                entry_type: draft.entry_type,
                description: draft.description.clone(),
                metadata: draft.metadata.clone(),
                created_at,
                reversed_at: None,
                reversal_of,
            };

            let expected_head = head.map(|h| h.entry_id);
            let committed = match reversal_of {
                None => self.store.commit(&entry, expected_head).await,
                Some(original) => {
                    self.store
                        .commit_reversal(&entry, original, created_at, expected_head)
                        .await
                }
            };

            match committed {
                Ok(()) => {
                    debug!(
                        owner = %entry.owner,
                        entry = %entry.id,
                        entry_type = %entry.entry_type,
                        amount = %entry.amount,
                        balance = %entry.running_balance,
                        "entry committed"
                    );
                    return Ok(entry);
                }
                Err(err) if err.is_conflict() && attempt < attempts => {
                    warn!(owner = %entry.owner, attempt, "commit conflict, retrying");
                    continue;
                }
                Err(err) if err.is_conflict() => {
                    return Err(LedgerError::CommitConflict {
                        owner: entry.owner.to_string(),
                        attempts,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        // Loop always returns; attempts >= 1.
        unreachable!("commit loop exited without a result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntryStore;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryEntryStore::new()), LedgerConfig::default())
    }

    fn draft(minor: i64) -> EntryDraft {
        EntryDraft::new(
            OwnerRef::new("business", "biz-1"),
            Amount::from_minor(minor, 2).unwrap(),
            EntryType::Charge,
        )
    }

    #[tokio::test]
    async fn test_append_assigns_running_balance() {
        let ledger = ledger();

        let first = ledger
            .append(draft(100_00), &OwnerPolicy::default())
            .await
            .unwrap();
        assert_eq!(first.running_balance.value(), dec!(100.00));

        let second = ledger
            .append(draft(-25_50), &OwnerPolicy::default())
            .await
            .unwrap();
        assert_eq!(second.running_balance.value(), dec!(74.50));
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_zero_amount_never_commits() {
        let ledger = ledger();
        let result = ledger.append(draft(0), &OwnerPolicy::default()).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let head = ledger.store().head(&OwnerRef::new("business", "biz-1")).await.unwrap();
        assert!(head.is_none());
    }

    #[tokio::test]
    async fn test_reverse_unknown_entry() {
        let ledger = ledger();
        let result = ledger.reverse(EntryId::new_v7(), "oops").await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }
}
