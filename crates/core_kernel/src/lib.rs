//! Core Kernel - Foundational types for the ledger engine
//!
//! This crate provides the fundamental building blocks used across the
//! ledger crates:
//! - Scale-aware amounts with precise decimal arithmetic
//! - Polymorphic owner references
//! - Strongly-typed identifiers

pub mod amount;
pub mod identifiers;
pub mod owner;

pub use amount::{Amount, AmountError, MAX_SCALE};
pub use identifiers::EntryId;
pub use owner::OwnerRef;
