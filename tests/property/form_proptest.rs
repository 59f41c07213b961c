//! Property-based tests for transaction entry and the shown ledger

use offline_ledger::client::{TransactionForm, TransactionLedger};
use offline_ledger::shared::Direction;
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Add), Just(Direction::Subtract)]
}

proptest! {
    #[test]
    fn test_direction_sets_sign(name in "[a-z]{1,12}", amount in 0i64..1_000_000, dir in direction()) {
        let record = TransactionForm::new(name.clone(), amount.to_string(), dir)
            .into_record()
            .unwrap();
        prop_assert_eq!(record.name, name);
        prop_assert_eq!(Some(record.value), dir.apply(amount));
    }

    #[test]
    fn test_blank_name_is_rejected(name in "[ \t]{0,4}", amount in 1i64..1000) {
        let result = TransactionForm::new(name, amount.to_string(), Direction::Add).into_record();
        prop_assert!(result.is_err());
    }

    #[test]
    fn test_total_is_sum_of_entries(amounts in prop::collection::vec(-10_000i64..10_000, 0..30)) {
        let mut ledger = TransactionLedger::new();
        for (i, amount) in amounts.iter().enumerate() {
            let dir = if *amount < 0 { Direction::Subtract } else { Direction::Add };
            let record = TransactionForm::new(format!("t{}", i), amount.abs().to_string(), dir)
                .into_record()
                .unwrap();
            ledger.push_front(record);
        }
        prop_assert_eq!(ledger.total(), amounts.iter().sum::<i64>());
        prop_assert_eq!(ledger.len(), amounts.len());
    }
}
