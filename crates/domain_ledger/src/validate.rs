//! Entry validation
//!
//! Structural checks against the draft itself, plus policy checks that
//! need the owner's current balance. Validation is pure: it never touches
//! storage and never mutates anything. A rejected draft leaves no trace.

use core_kernel::Amount;

use crate::entry::EntryDraft;
use crate::error::ValidationError;
use crate::store::HeadSnapshot;

/// Per-owner policy flags supplied by the producing collaborator
///
/// The ledger does not persist owner configuration; callers pass the
/// policy with each append, the same way they own the meaning of the
/// owner reference itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerPolicy {
    /// When false, an append that would take the running balance below
    /// zero is rejected with `InsufficientBalance`
    pub allow_negative_balance: bool,
}

impl Default for OwnerPolicy {
    fn default() -> Self {
        Self {
            allow_negative_balance: true,
        }
    }
}

impl OwnerPolicy {
    /// Policy that rejects appends taking the balance below zero
    pub fn no_overdraft() -> Self {
        Self {
            allow_negative_balance: false,
        }
    }
}

/// Checks a draft for structural validity
///
/// # Errors
///
/// - `MissingOwner` if the owner kind or id is blank
/// - `ZeroAmount` if the movement is zero (it carries no ledger meaning)
pub fn validate_draft(draft: &EntryDraft) -> Result<(), ValidationError> {
    if draft.owner.is_empty() {
        return Err(ValidationError::MissingOwner);
    }
    if draft.amount.is_zero() {
        return Err(ValidationError::ZeroAmount);
    }
    Ok(())
}

/// Checks the draft's declared scale against the owner's sequence
///
/// The first committed entry fixes the owner's scale; every later entry
/// must declare the same one.
pub fn check_scale(amount: &Amount, head: Option<&HeadSnapshot>) -> Result<(), ValidationError> {
    if let Some(head) = head {
        let expected = head.running_balance.scale();
        if amount.scale() != expected {
            return Err(ValidationError::ScaleMismatch {
                expected,
                actual: amount.scale(),
            });
        }
    }
    Ok(())
}

/// Enforces the negative-balance policy against the prospective balance
pub fn check_balance_policy(
    policy: &OwnerPolicy,
    prior: &Amount,
    amount: &Amount,
    next: &Amount,
) -> Result<(), ValidationError> {
    if !policy.allow_negative_balance && next.is_negative() {
        return Err(ValidationError::InsufficientBalance {
            attempted: amount.value(),
            available: prior.value(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use chrono::Utc;
    use core_kernel::{EntryId, OwnerRef};
    use rust_decimal_macros::dec;

    fn draft(amount: Amount) -> EntryDraft {
        EntryDraft::new(OwnerRef::new("business", "biz-1"), amount, EntryType::Charge)
    }

    fn head(balance: Amount) -> HeadSnapshot {
        HeadSnapshot {
            entry_id: EntryId::new_v7(),
            running_balance: balance,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = validate_draft(&draft(Amount::zero(2)));
        assert_eq!(result, Err(ValidationError::ZeroAmount));
    }

    #[test]
    fn test_missing_owner_rejected() {
        let mut d = draft(Amount::new(dec!(1.00), 2).unwrap());
        d.owner = OwnerRef::new("", "biz-1");
        assert_eq!(validate_draft(&d), Err(ValidationError::MissingOwner));
    }

    #[test]
    fn test_valid_draft_accepted() {
        assert!(validate_draft(&draft(Amount::new(dec!(-3.25), 2).unwrap())).is_ok());
    }

    #[test]
    fn test_scale_fixed_by_first_entry() {
        let head = head(Amount::new(dec!(10.00), 2).unwrap());
        let wrong = Amount::new(dec!(1.000), 3).unwrap();

        assert_eq!(
            check_scale(&wrong, Some(&head)),
            Err(ValidationError::ScaleMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert!(check_scale(&Amount::new(dec!(1.00), 2).unwrap(), Some(&head)).is_ok());
    }

    #[test]
    fn test_first_entry_sets_any_scale() {
        assert!(check_scale(&Amount::new(dec!(1.000), 3).unwrap(), None).is_ok());
    }

    #[test]
    fn test_insufficient_balance() {
        let prior = Amount::new(dec!(50.00), 2).unwrap();
        let amount = Amount::new(dec!(-80.00), 2).unwrap();
        let next = prior.checked_add(&amount).unwrap();

        let result = check_balance_policy(&OwnerPolicy::no_overdraft(), &prior, &amount, &next);
        assert_eq!(
            result,
            Err(ValidationError::InsufficientBalance {
                attempted: dec!(-80.00),
                available: dec!(50.00),
            })
        );

        // Default policy allows overdraft
        assert!(check_balance_policy(&OwnerPolicy::default(), &prior, &amount, &next).is_ok());
    }

    #[test]
    fn test_exact_drain_to_zero_allowed() {
        let prior = Amount::new(dec!(50.00), 2).unwrap();
        let amount = Amount::new(dec!(-50.00), 2).unwrap();
        let next = prior.checked_add(&amount).unwrap();

        assert!(check_balance_policy(&OwnerPolicy::no_overdraft(), &prior, &amount, &next).is_ok());
    }
}
