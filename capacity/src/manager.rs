//! The capacity manager — owner, group, and per-action ceilings.

use crate::error::CapacityError;
use cohort_types::{bps_of, mul_div, EngineParams, BPS_DENOM};
use serde::{Deserialize, Serialize};

/// Computes capacity ceilings from governance-vote shares and stakes.
///
/// All inputs are raw asset/vote units read from the collaborators by the
/// facade at call time. Ceilings are recomputed only when the stake they
/// derive from changes — a later vote-share drop is not retroactively
/// enforced on existing groups, but blocks further activation/expansion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapacityManager {
    params: EngineParams,
}

impl CapacityManager {
    pub fn new(params: EngineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// The owner-wide capacity ceiling:
    /// `total_supply × owner_votes / total_votes × capacity_multiplier`.
    ///
    /// Zero when there are no governance votes at all — no capacity can be
    /// granted without a governance baseline.
    pub fn owner_capacity(&self, total_supply: u128, owner_votes: u128, total_votes: u128) -> u128 {
        if total_votes == 0 {
            return 0;
        }
        mul_div(total_supply, owner_votes, total_votes)
            .saturating_mul(self.params.capacity_multiplier)
    }

    /// A single group's capacity ceiling:
    /// `min(staked × staking_multiplier, owner_capacity − consumed)`.
    ///
    /// `consumed` is the capacity already taken by the owner's *other*
    /// active groups.
    pub fn group_capacity(&self, staked: u128, owner_capacity: u128, consumed: u128) -> u128 {
        let from_stake = staked.saturating_mul(self.params.staking_multiplier);
        let owner_headroom = owner_capacity.saturating_sub(consumed);
        from_stake.min(owner_headroom)
    }

    /// The minimum activation stake implied by the vote-ratio floor: the
    /// stake that would back a capacity equal to the floor's slice of supply.
    pub fn min_activation_stake(&self, total_supply: u128) -> u128 {
        bps_of(total_supply, self.params.min_gov_vote_ratio_bps) / self.params.staking_multiplier
    }

    /// Check whether `owner` may activate (or expand) a group with `staked`
    /// collateral.
    ///
    /// `owner_total_staked` must already include the stake under review
    /// across all of the owner's active groups.
    pub fn check_activation(
        &self,
        staked: u128,
        total_supply: u128,
        owner_votes: u128,
        total_votes: u128,
        owner_total_staked: u128,
    ) -> Result<(), CapacityError> {
        let minimum = self.min_activation_stake(total_supply);
        if staked < minimum {
            return Err(CapacityError::StakeBelowMinimum { staked, minimum });
        }

        let share_bps = if total_votes == 0 {
            0
        } else {
            mul_div(owner_votes, BPS_DENOM, total_votes)
        };
        if share_bps < self.params.min_gov_vote_ratio_bps as u128 {
            return Err(CapacityError::VoteShareBelowFloor {
                share_bps,
                required_bps: self.params.min_gov_vote_ratio_bps,
            });
        }

        let ceiling =
            self.owner_capacity(total_supply, owner_votes, total_votes) / self.params.staking_multiplier;
        if owner_total_staked > ceiling {
            return Err(CapacityError::OwnerStakeExceeded {
                total: owner_total_staked,
                ceiling,
            });
        }

        Ok(())
    }

    /// The vote-weighted cap on any account's cumulative joined amount:
    /// `join_token_supply × max_join_ratio × action_votes / total_votes`.
    ///
    /// Zero if either vote quantity is zero — no votes means no
    /// participation allowed this round.
    pub fn max_join_amount_for_action(
        &self,
        join_token_supply: u128,
        action_votes: u128,
        total_votes: u128,
    ) -> u128 {
        if action_votes == 0 || total_votes == 0 {
            return 0;
        }
        let ratio_capped = bps_of(join_token_supply, self.params.max_join_ratio_bps);
        mul_div(ratio_capped, action_votes, total_votes)
    }
}
