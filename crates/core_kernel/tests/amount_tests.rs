//! Tests for core_kernel amount and identifier types

use core_kernel::{Amount, AmountError, EntryId, OwnerRef, MAX_SCALE};
use rust_decimal_macros::dec;

mod amount_construction {
    use super::*;

    #[test]
    fn test_new_at_various_scales() {
        for scale in 0..=4u32 {
            let a = Amount::new(dec!(7), scale).unwrap();
            assert_eq!(a.scale(), scale);
            assert_eq!(a.value(), dec!(7));
        }
    }

    #[test]
    fn test_scale_zero_rejects_fractions() {
        let result = Amount::new(dec!(1.5), 0);
        assert!(matches!(result, Err(AmountError::ExcessPrecision { .. })));
    }

    #[test]
    fn test_zero_is_zero_at_any_scale() {
        assert!(Amount::zero(0).is_zero());
        assert!(Amount::zero(MAX_SCALE).is_zero());
    }

    #[test]
    fn test_signs() {
        let positive = Amount::new(dec!(0.01), 2).unwrap();
        let negative = Amount::new(dec!(-0.01), 2).unwrap();
        let zero = Amount::zero(2);

        assert!(positive.is_positive() && !positive.is_negative());
        assert!(negative.is_negative() && !negative.is_positive());
        assert!(!zero.is_positive() && !zero.is_negative());
    }
}

mod amount_arithmetic {
    use super::*;

    #[test]
    fn test_sum_of_mixed_signs() {
        let a = Amount::new(dec!(100.00), 2).unwrap();
        let b = Amount::new(dec!(-25.50), 2).unwrap();
        assert_eq!(a.checked_add(&b).unwrap().value(), dec!(74.50));
    }

    #[test]
    fn test_checked_sub() {
        let a = Amount::new(dec!(50.00), 2).unwrap();
        let b = Amount::new(dec!(80.00), 2).unwrap();
        assert_eq!(a.checked_sub(&b).unwrap().value(), dec!(-30.00));
    }

    #[test]
    fn test_abs() {
        let a = Amount::new(dec!(-12.34), 2).unwrap();
        assert_eq!(a.abs().value(), dec!(12.34));
    }

    #[test]
    fn test_mismatched_scales_never_add() {
        let cents = Amount::new(dec!(1.00), 2).unwrap();
        let mills = Amount::new(dec!(1.000), 3).unwrap();
        assert!(cents.checked_add(&mills).is_err());
        assert!(mills.checked_add(&cents).is_err());
    }
}

mod identifier_tests {
    use super::*;

    #[test]
    fn test_entry_id_round_trip() {
        let id = EntryId::new_v7();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entry_id_parses_bare_uuid() {
        let id = EntryId::new_v7();
        let bare = id.as_uuid().to_string();
        let parsed: EntryId = bare.parse().unwrap();
        assert_eq!(id, parsed);
    }
}

mod owner_ref_tests {
    use super::*;

    #[test]
    fn test_owner_ref_as_map_key() {
        use std::collections::HashMap;

        let mut balances: HashMap<OwnerRef, Amount> = HashMap::new();
        balances.insert(OwnerRef::new("business", "biz-1"), Amount::zero(2));

        assert!(balances.contains_key(&OwnerRef::new("business", "biz-1")));
        assert!(!balances.contains_key(&OwnerRef::new("user", "biz-1")));
    }
}
