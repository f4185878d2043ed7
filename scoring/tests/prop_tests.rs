use proptest::prelude::*;

use cohort_scoring::{ScoringError, VerificationEngine};
use cohort_types::{Address, GroupId, Round};

fn addr(n: u8) -> Address {
    Address::new(format!("acct_{n:02}"))
}

const ROUND: Round = Round::GENESIS;
const AMPLE: u128 = u128::MAX / 1_000_000;

proptest! {
    /// After any sequence of finalizations and distrust votes, the round
    /// total equals the sum of stored group scores, no group score exceeds
    /// its raw score, and no voter's cumulative distrust exceeds their
    /// verification weight.
    #[test]
    fn score_invariants_hold_under_distrust(
        groups in proptest::collection::vec(
            // (owner, member amount, score, capacity divisor)
            (0u8..4, 1u128..10_000, 0u64..=100, 1u128..4),
            1..10,
        ),
        votes in proptest::collection::vec(
            // (voter, target, weight)
            (0u8..4, 0u8..4, 1u128..20_000),
            0..15,
        ),
    ) {
        let mut engine = VerificationEngine::new();

        for (i, (owner, amount, score, cap_div)) in groups.iter().enumerate() {
            let owner = addr(*owner);
            let group = GroupId::new(i as u64 + 1);
            let roster = vec![(addr(100 + i as u8), *amount)];
            // Small, varied capacities so some groups get scaled-down
            // factors and some finalizations fail outright.
            let capacity = 5_000 / cap_div;
            match engine.submit_batch(ROUND, group, &owner, &owner, 0, &[*score], &roster, capacity) {
                Ok(_) => {}
                Err(ScoringError::NoVerifyCapacity { .. }) => {}
                Err(e) => return Err(TestCaseError::fail(format!("unexpected: {e}"))),
            }
        }

        for (voter, target, weight) in votes {
            let voter = addr(voter);
            let target = addr(target);
            match engine.cast_distrust(ROUND, &voter, &target, weight, "prop vote") {
                Ok(()) => {}
                Err(ScoringError::DistrustExceedsWeight { .. }) => {}
                Err(e) => return Err(TestCaseError::fail(format!("unexpected: {e}"))),
            }

            // Invariant: round total is the exact sum of stored scores.
            let sum: u128 = engine
                .finalized_groups(ROUND)
                .iter()
                .map(|g| engine.group_score(ROUND, *g))
                .sum();
            prop_assert_eq!(engine.round_total_score(ROUND), sum);

            // Invariant: a stored score never exceeds its raw score.
            for g in engine.finalized_groups(ROUND) {
                let state = engine.score_state(ROUND, *g).unwrap();
                prop_assert!(state.group_score <= state.raw_score);
            }

            // Invariant: cumulative distrust ≤ voter weight.
            for v in 0u8..4 {
                for t in 0u8..4 {
                    let cast = engine.distrust_between(ROUND, &addr(v), &addr(t));
                    prop_assert!(cast <= engine.verify_weight(ROUND, &addr(v)));
                }
            }
        }
    }

    /// Batches accepted for a group tile [0, roster) exactly: any split of
    /// the roster into sequential batches finalizes with the same score.
    #[test]
    fn batch_splits_are_equivalent(
        amounts in proptest::collection::vec(1u128..1000, 1..12),
        split_at in 0usize..12,
    ) {
        let owner = addr(1);
        let roster: Vec<(Address, u128)> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| (addr(50 + i as u8), *a))
            .collect();
        let scores: Vec<u64> = (0..roster.len() as u64).map(|i| (i * 13) % 101).collect();

        // One shot.
        let mut one = VerificationEngine::new();
        one.submit_batch(ROUND, GroupId::new(1), &owner, &owner, 0, &scores, &roster, AMPLE)
            .unwrap();

        // Split at an arbitrary interior point.
        let mid = split_at.min(roster.len().saturating_sub(1)).max(1).min(roster.len());
        let mut two = VerificationEngine::new();
        if mid < roster.len() {
            two.submit_batch(ROUND, GroupId::new(1), &owner, &owner, 0, &scores[..mid], &roster, AMPLE)
                .unwrap();
            two.submit_batch(ROUND, GroupId::new(1), &owner, &owner, mid, &scores[mid..], &roster, AMPLE)
                .unwrap();
        } else {
            two.submit_batch(ROUND, GroupId::new(1), &owner, &owner, 0, &scores, &roster, AMPLE)
                .unwrap();
        }

        prop_assert_eq!(
            one.group_score(ROUND, GroupId::new(1)),
            two.group_score(ROUND, GroupId::new(1))
        );
    }
}
