//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random ledger data
//! that maintains domain invariants.

use core_kernel::{Amount, OwnerRef};
use domain_ledger::EntryType;
use proptest::prelude::*;

/// Strategy for non-zero minor-unit values
pub fn nonzero_minor_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![-1_000_000_000i64..-1i64, 1i64..1_000_000_000i64]
}

/// Strategy for valid non-zero amounts at a fixed scale
pub fn amount_strategy(scale: u32) -> impl Strategy<Value = Amount> {
    nonzero_minor_strategy()
        .prop_map(move |minor| Amount::from_minor(minor, scale).expect("scale within bounds"))
}

/// Strategy for valid positive amounts at a fixed scale
pub fn positive_amount_strategy(scale: u32) -> impl Strategy<Value = Amount> {
    (1i64..1_000_000_000i64)
        .prop_map(move |minor| Amount::from_minor(minor, scale).expect("scale within bounds"))
}

/// Strategy for the directly-postable entry types (reversal excluded,
/// it is only minted by the reversal path)
pub fn postable_entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        Just(EntryType::Charge),
        Just(EntryType::Refund),
        Just(EntryType::Adjustment),
        Just(EntryType::Accrual),
    ]
}

/// Strategy for owner references
pub fn owner_strategy() -> impl Strategy<Value = OwnerRef> {
    (
        prop_oneof![Just("business"), Just("user"), Just("partner")],
        "[a-z0-9]{4,12}",
    )
        .prop_map(|(kind, id)| OwnerRef::new(kind, id))
}
