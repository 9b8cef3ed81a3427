//! Ledger domain - append-mostly movements with per-owner running
//! balances
//!
//! This crate implements the credit/balance ledger engine:
//!
//! - [`entry`]: the `LedgerEntry` entity and `EntryDraft` proposals
//! - [`validate`]: structural and policy validation
//! - [`balance`]: pure running-balance arithmetic
//! - [`store`]: the storage port adapters implement
//! - [`memory`]: the in-memory adapter
//! - [`ledger`]: the engine - serialized appends and compensating
//!   reversals
//! - [`query`]: the read-only facade (balances, history, audit export)
//!
//! # Guarantees
//!
//! - Per-owner appends are strictly serialized; distinct owners commit
//!   concurrently
//! - Committed entries are immutable; reversal appends a compensating
//!   entry and flags the original in one atomic step
//! - Reversal is idempotent: a second attempt returns the existing
//!   compensation
//! - History retains every entry ever committed, voided ones included

pub mod balance;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod query;
pub mod store;
pub mod validate;

pub use entry::{EntryDraft, EntryType, LedgerEntry, Metadata};
pub use error::{LedgerError, StoreError, ValidationError};
pub use ledger::{Ledger, LedgerConfig, ReversalOutcome};
pub use memory::MemoryEntryStore;
pub use query::{AuditRecord, QueryService};
pub use store::{
    EntryStore, HeadSnapshot, HistoryPage, PageRequest, PageToken, TimeRange, DEFAULT_PAGE_LIMIT,
};
pub use validate::OwnerPolicy;
