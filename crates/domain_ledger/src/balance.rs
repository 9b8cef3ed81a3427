//! Balance calculation
//!
//! Pure arithmetic over exact fixed-point amounts: the running balance
//! after a movement is the prior balance plus the signed amount, at the
//! owner's declared scale. No rounding ever happens here.

use core_kernel::{Amount, AmountError};

/// Computes the running balance after applying `amount` to `prior`
///
/// # Errors
///
/// - `ScaleMismatch` if the operands declare different scales
/// - `Overflow` if the sum exceeds decimal range
pub fn next_balance(prior: &Amount, amount: &Amount) -> Result<Amount, AmountError> {
    prior.checked_add(amount)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Folding a sequence of movements through next_balance equals
        /// the plain sum of the movements.
        #[test]
        fn folded_balance_equals_sum(amounts in proptest::collection::vec(-1_000_000i64..1_000_000i64, 1..50)) {
            let mut balance = Amount::zero(2);
            for minor in &amounts {
                let amount = Amount::from_minor(*minor, 2).unwrap();
                balance = next_balance(&balance, &amount).unwrap();
            }

            let expected = Amount::from_minor(amounts.iter().sum::<i64>(), 2).unwrap();
            prop_assert_eq!(balance, expected);
        }
    }
}
