//! Ledger error taxonomy
//!
//! Four families: validation rejections (never retried), concurrency
//! errors (retryable by the caller with backoff), consistency outcomes,
//! and storage faults (fatal to the attempt).

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{AmountError, EntryId};

/// Structural or policy rejection of a proposed entry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Entry amount must be non-zero")]
    ZeroAmount,

    #[error("Scale mismatch: owner sequence uses {expected} fractional digits, entry declares {actual}")]
    ScaleMismatch { expected: u32, actual: u32 },

    #[error("Entry is missing an owner identity")]
    MissingOwner,

    #[error("Insufficient balance: attempted {attempted}, available {available}")]
    InsufficientBalance {
        attempted: Decimal,
        available: Decimal,
    },
}

/// Errors surfaced by a storage adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// The owner's head moved between read and commit
    #[error("Commit conflict: head of {owner} moved")]
    CommitConflict { owner: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Durable-write failure; fatal to the attempt, never retried internally
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        StoreError::Corrupt(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::CommitConflict { .. })
    }
}

/// Top-level error returned by ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The owner's append section could not be acquired in time
    #[error("Owner lock timeout for {owner} after {waited_ms}ms")]
    OwnerLockTimeout { owner: String, waited_ms: u64 },

    /// Optimistic commit kept conflicting until the attempt budget ran out
    #[error("Commit conflict for {owner} after {attempts} attempts")]
    CommitConflict { owner: String, attempts: u32 },

    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("Entry {0} is a compensating entry and chained reversals are disabled")]
    ChainedReversalForbidden(EntryId),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl LedgerError {
    /// Returns true if the caller may retry the same request with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::OwnerLockTimeout { .. } | LedgerError::CommitConflict { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Storage(err)
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::ScaleMismatch { expected, actual } => {
                LedgerError::Validation(ValidationError::ScaleMismatch { expected, actual })
            }
            other => LedgerError::Calculation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = LedgerError::OwnerLockTimeout {
            owner: "business/biz-1".to_string(),
            waited_ms: 5000,
        };
        assert!(timeout.is_retryable());

        let conflict = LedgerError::CommitConflict {
            owner: "business/biz-1".to_string(),
            attempts: 4,
        };
        assert!(conflict.is_retryable());

        let validation = LedgerError::Validation(ValidationError::ZeroAmount);
        assert!(!validation.is_retryable());

        let not_found = LedgerError::NotFound(EntryId::new_v7());
        assert!(!not_found.is_retryable());
        assert!(not_found.is_not_found());
    }

    #[test]
    fn test_amount_scale_error_maps_to_validation() {
        let err: LedgerError = AmountError::ScaleMismatch {
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::ScaleMismatch { expected: 2, actual: 3 })
        ));
    }
}
