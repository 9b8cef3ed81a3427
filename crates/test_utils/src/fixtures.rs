//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common ledger entities. These
//! fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{Amount, OwnerRef};
use fake::faker::lorem::en::Word;
use fake::Fake;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Amount test data
pub struct AmountFixtures;

impl AmountFixtures {
    /// A standard scale-2 credit
    pub fn credit_100() -> Amount {
        Amount::new(dec!(100.00), 2).unwrap()
    }

    /// A standard scale-2 debit
    pub fn debit_25_50() -> Amount {
        Amount::new(dec!(-25.50), 2).unwrap()
    }

    /// A zero amount, for rejection tests
    pub fn zero() -> Amount {
        Amount::zero(2)
    }

    /// A whole-unit amount (loyalty points style, no fractional digits)
    pub fn points_500() -> Amount {
        Amount::new(dec!(500), 0).unwrap()
    }
}

/// Fixture for owner references
pub struct OwnerFixtures;

impl OwnerFixtures {
    /// A stable business owner
    pub fn business() -> OwnerRef {
        OwnerRef::new("business", "biz-1")
    }

    /// A stable user owner
    pub fn user() -> OwnerRef {
        OwnerRef::new("user", "u-42")
    }

    /// A fresh owner that no other test has touched
    pub fn unique() -> OwnerRef {
        let word: String = Word().fake();
        OwnerRef::new("business", format!("{word}-{}", Uuid::now_v7()))
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed instant well in the past
    pub fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// A fixed instant after `jan_first`
    pub fn mid_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }
}
