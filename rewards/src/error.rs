//! Reward-distribution errors.

use cohort_types::{Address, GroupId, Round};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("{group} already claimed its reward for {round}")]
    AlreadyClaimed { round: Round, group: GroupId },

    #[error("{group} has nothing to claim for {round}")]
    NothingToClaim { round: Round, group: GroupId },

    #[error("{0} is still open")]
    RoundStillOpen(Round),

    #[error("{0} had finalized groups — its pool is claimable, not burnable")]
    RoundHasScores(Round),

    #[error("{count} payout recipients configured, {max} allowed")]
    TooManyRecipients { count: usize, max: usize },

    #[error("payout ratios sum to {sum}, above one unit")]
    RatioSumAboveUnit { sum: u128 },

    #[error("duplicate payout recipient {0}")]
    DuplicateRecipient(Address),

    #[error("payout recipient {0} has a zero ratio")]
    ZeroRatioRecipient(Address),

    #[error("payout recipient {0} is the engine's own account")]
    SelfReferentialRecipient(Address),
}
