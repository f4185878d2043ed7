//! Capacity-specific errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("stake {staked} is below the activation minimum {minimum}")]
    StakeBelowMinimum { staked: u128, minimum: u128 },

    #[error("owner vote share {share_bps} bps is below the {required_bps} bps floor")]
    VoteShareBelowFloor { share_bps: u128, required_bps: u32 },

    #[error("owner stake would reach {total}, above the {ceiling} stake ceiling")]
    OwnerStakeExceeded { total: u128, ceiling: u128 },

    #[error("capacity arithmetic overflowed")]
    Overflow,
}
