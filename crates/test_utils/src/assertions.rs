//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Amount;
use domain_ledger::LedgerEntry;
use rust_decimal::Decimal;

/// Asserts that an amount has the expected value and scale
///
/// # Panics
///
/// Panics if either the value or the declared scale differs
pub fn assert_amount_eq(actual: &Amount, expected_value: Decimal, expected_scale: u32) {
    assert_eq!(
        actual.value(),
        expected_value,
        "Amount value mismatch: actual={}, expected={}",
        actual.value(),
        expected_value
    );
    assert_eq!(
        actual.scale(),
        expected_scale,
        "Amount scale mismatch: actual={}, expected={}",
        actual.scale(),
        expected_scale
    );
}

/// Asserts that a sequence of entries forms a valid running-balance
/// chain: each entry's stored balance equals the previous entry's
/// balance plus its own amount
///
/// # Panics
///
/// Panics at the first entry that breaks the chain
pub fn assert_balance_chain(entries: &[LedgerEntry]) {
    let mut expected = Decimal::ZERO;
    for (position, entry) in entries.iter().enumerate() {
        expected += entry.amount.value();
        assert_eq!(
            entry.running_balance.value(),
            expected,
            "Balance chain broken at position {position} (entry {}): stored={}, expected={}",
            entry.id,
            entry.running_balance.value(),
            expected
        );
    }
}

/// Asserts that timestamps never decrease along a sequence of entries
///
/// # Panics
///
/// Panics at the first entry committed before its predecessor
pub fn assert_commit_order(entries: &[LedgerEntry]) {
    for (position, pair) in entries.windows(2).enumerate() {
        assert!(
            pair[0].created_at <= pair[1].created_at,
            "Commit order broken between positions {position} and {}: {} > {}",
            position + 1,
            pair[0].created_at,
            pair[1].created_at
        );
    }
}
