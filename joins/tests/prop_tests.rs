use proptest::prelude::*;

use cohort_joins::{JoinError, JoinLedger};
use cohort_types::{Address, EngineParams, GroupId, Round};

fn addr(n: u8) -> Address {
    Address::new(format!("acct_{n:02}"))
}

const CAP: u128 = u128::MAX / 4;

proptest! {
    /// Any interleaving of joins and exits keeps the dense membership
    /// indexes consistent with the authoritative join map, and never lets a
    /// group's total exceed its capacity.
    #[test]
    fn join_exit_sequences_stay_consistent(
        ops in proptest::collection::vec((0u8..8, 0u8..3, 1u128..400), 1..80),
    ) {
        let mut ledger = JoinLedger::new(EngineParams {
            min_join_amount: 1,
            ..EngineParams::cohort_defaults()
        });
        let groups = [GroupId::new(1), GroupId::new(2), GroupId::new(3)];
        for g in groups {
            ledger.activate(g, 100, 1000, String::new(), Round::new(1)).unwrap();
        }

        for (account, group, amount) in ops {
            let account = addr(account);
            let group = groups[group as usize];
            // Alternate joins and exits based on current membership.
            if ledger.join_info(&account).is_some() && amount % 3 == 0 {
                ledger.exit(&account, Round::new(1)).unwrap();
            } else {
                match ledger.join(&account, group, amount, CAP, Round::new(1)) {
                    Ok(()) => {}
                    Err(JoinError::AlreadyInOtherGroup(_))
                    | Err(JoinError::GroupCapacityExceeded { .. }) => {}
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected: {e}"))),
                }
            }

            prop_assert!(ledger.check_consistency());
            for g in groups {
                let info = ledger.group(g).unwrap();
                prop_assert!(info.total_joined <= info.capacity);
            }
        }
    }
}
