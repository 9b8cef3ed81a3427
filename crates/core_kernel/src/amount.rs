//! Scale-aware monetary amounts with precise decimal arithmetic
//!
//! This module provides the `Amount` type used for every movement and
//! running balance in the ledger. Amounts use rust_decimal for exact
//! arithmetic and carry an explicit decimal scale (number of fractional
//! digits). All amounts recorded against one owner share a scale, so
//! mixing scales is an error the same way mixing currencies would be.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use thiserror::Error;

/// Maximum supported decimal scale.
///
/// rust_decimal holds 28-29 significant digits; scales beyond 12 leave
/// too little integer headroom for running balances.
pub const MAX_SCALE: u32 = 12;

/// Errors that can occur during amount operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Scale mismatch: expected {expected} fractional digits, got {actual}")]
    ScaleMismatch { expected: u32, actual: u32 },

    #[error("Value {value} does not fit scale {scale}")]
    ExcessPrecision { value: Decimal, scale: u32 },

    #[error("Scale {0} exceeds the supported maximum of {MAX_SCALE}")]
    ScaleTooLarge(u32),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A signed fixed-point amount with a declared decimal scale
///
/// `Amount` is exact: it is never constructed from floating point, and
/// arithmetic never rounds. Construction rejects values carrying more
/// fractional digits than the declared scale, and addition rejects
/// operands with different scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    value: Decimal,
    scale: u32,
}

impl Amount {
    /// Creates a new Amount, verifying the value fits the declared scale
    ///
    /// # Errors
    ///
    /// - `ScaleTooLarge` if `scale > MAX_SCALE`
    /// - `ExcessPrecision` if `value` has more fractional digits than `scale`
    pub fn new(value: Decimal, scale: u32) -> Result<Self, AmountError> {
        if scale > MAX_SCALE {
            return Err(AmountError::ScaleTooLarge(scale));
        }
        let normalized = value.normalize();
        if normalized.scale() > scale {
            return Err(AmountError::ExcessPrecision { value, scale });
        }
        let mut value = normalized;
        value.rescale(scale);
        Ok(Self { value, scale })
    }

    /// Creates an Amount from an integer count of minor units
    /// (e.g. cents for scale 2)
    pub fn from_minor(minor_units: i64, scale: u32) -> Result<Self, AmountError> {
        if scale > MAX_SCALE {
            return Err(AmountError::ScaleTooLarge(scale));
        }
        Ok(Self {
            value: Decimal::new(minor_units, scale),
            scale,
        })
    }

    /// Creates a zero amount at the given scale
    pub fn zero(scale: u32) -> Self {
        let mut value = dec!(0);
        value.rescale(scale.min(MAX_SCALE));
        Self {
            value,
            scale: scale.min(MAX_SCALE),
        }
    }

    /// Returns the underlying decimal value
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the declared scale
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.value.is_sign_positive() && !self.value.is_zero()
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            value: self.value.abs(),
            scale: self.scale,
        }
    }

    /// Checked addition that rejects mismatched scales
    ///
    /// # Errors
    ///
    /// - `ScaleMismatch` if the operands declare different scales
    /// - `Overflow` if the sum exceeds decimal range
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        if self.scale != other.scale {
            return Err(AmountError::ScaleMismatch {
                expected: self.scale,
                actual: other.scale,
            });
        }
        let mut value = self
            .value
            .checked_add(other.value)
            .ok_or(AmountError::Overflow)?;
        value.rescale(self.scale);
        Ok(Amount {
            value,
            scale: self.scale,
        })
    }

    /// Checked subtraction that rejects mismatched scales
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.checked_add(&-*other)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            value: -self.value,
            scale: self.scale,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.dp$}", self.value, dp = self.scale as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_creation() {
        let a = Amount::new(dec!(100.50), 2).unwrap();
        assert_eq!(a.value(), dec!(100.50));
        assert_eq!(a.scale(), 2);
    }

    #[test]
    fn test_amount_rejects_excess_precision() {
        let result = Amount::new(dec!(1.005), 2);
        assert!(matches!(result, Err(AmountError::ExcessPrecision { .. })));
    }

    #[test]
    fn test_amount_accepts_trailing_zeros() {
        // 1.50 stored as 1.5000 still fits scale 2 after normalization
        let a = Amount::new(dec!(1.5000), 2).unwrap();
        assert_eq!(a.value(), dec!(1.50));
    }

    #[test]
    fn test_amount_from_minor() {
        let a = Amount::from_minor(10050, 2).unwrap();
        assert_eq!(a.value(), dec!(100.50));
    }

    #[test]
    fn test_scale_mismatch() {
        let a = Amount::new(dec!(1.00), 2).unwrap();
        let b = Amount::new(dec!(1.000), 3).unwrap();
        let result = a.checked_add(&b);
        assert_eq!(
            result,
            Err(AmountError::ScaleMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_addition_and_negation() {
        let a = Amount::new(dec!(100.00), 2).unwrap();
        let b = Amount::new(dec!(-25.50), 2).unwrap();

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.value(), dec!(74.50));

        let negated = -sum;
        assert_eq!(negated.value(), dec!(-74.50));
    }

    #[test]
    fn test_display_pads_to_scale() {
        let a = Amount::new(dec!(5), 2).unwrap();
        assert_eq!(a.to_string(), "5.00");
    }

    #[test]
    fn test_scale_too_large() {
        assert!(matches!(
            Amount::new(dec!(1), MAX_SCALE + 1),
            Err(AmountError::ScaleTooLarge(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn addition_is_commutative(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64
        ) {
            let ma = Amount::from_minor(a, 2).unwrap();
            let mb = Amount::from_minor(b, 2).unwrap();

            prop_assert_eq!(ma.checked_add(&mb).unwrap(), mb.checked_add(&ma).unwrap());
        }

        #[test]
        fn negation_cancels(
            a in -1_000_000_000i64..1_000_000_000i64
        ) {
            let ma = Amount::from_minor(a, 2).unwrap();
            let sum = ma.checked_add(&-ma).unwrap();
            prop_assert!(sum.is_zero());
        }
    }
}
