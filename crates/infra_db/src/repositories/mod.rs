//! Storage adapter implementations
//!
//! This module provides the PostgreSQL implementation of the domain's
//! `EntryStore` port. The adapter encapsulates SQL and maps between
//! database rows and domain types; concurrency control is pessimistic
//! inside each commit (the owner's head row is locked for the duration
//! of the transaction).

pub mod ledger;

pub use ledger::PgEntryStore;
