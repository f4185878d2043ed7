//! Engine parameters — the per-deployment group configuration.
//!
//! Set once at engine construction and immutable afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("multiplier `{0}` must be non-zero")]
    ZeroMultiplier(&'static str),

    #[error("ratio `{name}` is {value} bps, above the 10000 bps maximum")]
    RatioAboveOne { name: &'static str, value: u32 },

    #[error("max payout recipients must be non-zero")]
    ZeroRecipientCap,
}

/// All engine parameters for one deployment (one owner class).
///
/// Stake/capacity multipliers, the governance-vote floor, join bounds,
/// and the reward distribution cap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineParams {
    /// Multiplier turning an owner's vote-share slice of supply into
    /// participation capacity.
    pub capacity_multiplier: u128,

    /// Multiplier turning staked collateral into group capacity.
    pub staking_multiplier: u128,

    /// Minimum governance-vote share (basis points) an owner must hold to
    /// activate a group. Also implies the minimum activation stake.
    pub min_gov_vote_ratio_bps: u32,

    /// Global minimum first-join amount (raw units). A group may raise this
    /// with its own `min_join_amount`, never lower it.
    pub min_join_amount: u128,

    /// Vote-weighted cap on any account's cumulative joined amount, as basis
    /// points of the join token supply (scaled by this deployment's vote
    /// share at join time).
    pub max_join_ratio_bps: u32,

    /// Governance-ratio reward cap multiplier (basis points). An owner's
    /// minted reward is capped at `gov_ratio × this × pool`; the excess is
    /// burned. 0 disables the cap.
    pub max_distribution_ratio_bps: u32,

    /// Maximum number of configured payout recipients.
    pub max_payout_recipients: usize,
}

impl EngineParams {
    /// COHORT defaults — the intended configuration for a live deployment.
    pub fn cohort_defaults() -> Self {
        Self {
            capacity_multiplier: 10,
            staking_multiplier: 5,
            min_gov_vote_ratio_bps: 100, // 1%
            min_join_amount: 1,
            max_join_ratio_bps: 500, // 5% of supply, vote-scaled
            max_distribution_ratio_bps: 0,
            max_payout_recipients: 16,
        }
    }

    /// Reject inconsistent configuration before the engine is built.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.capacity_multiplier == 0 {
            return Err(ParamsError::ZeroMultiplier("capacity_multiplier"));
        }
        if self.staking_multiplier == 0 {
            return Err(ParamsError::ZeroMultiplier("staking_multiplier"));
        }
        if self.min_gov_vote_ratio_bps > 10_000 {
            return Err(ParamsError::RatioAboveOne {
                name: "min_gov_vote_ratio_bps",
                value: self.min_gov_vote_ratio_bps,
            });
        }
        if self.max_join_ratio_bps > 10_000 {
            return Err(ParamsError::RatioAboveOne {
                name: "max_join_ratio_bps",
                value: self.max_join_ratio_bps,
            });
        }
        if self.max_payout_recipients == 0 {
            return Err(ParamsError::ZeroRecipientCap);
        }
        Ok(())
    }
}

/// Default is the COHORT configuration.
impl Default for EngineParams {
    fn default() -> Self {
        Self::cohort_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineParams::cohort_defaults().validate().is_ok());
    }

    #[test]
    fn zero_multiplier_rejected() {
        let mut p = EngineParams::cohort_defaults();
        p.staking_multiplier = 0;
        assert!(matches!(
            p.validate(),
            Err(ParamsError::ZeroMultiplier("staking_multiplier"))
        ));
    }

    #[test]
    fn ratio_above_one_rejected() {
        let mut p = EngineParams::cohort_defaults();
        p.max_join_ratio_bps = 10_001;
        assert!(matches!(
            p.validate(),
            Err(ParamsError::RatioAboveOne { .. })
        ));
    }
}
