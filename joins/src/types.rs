//! Per-group and per-account join records.

use cohort_types::{GroupId, GroupLifecycle, Round, RoundHistory};
use serde::{Deserialize, Serialize};

/// Everything the engine stores about one group.
///
/// Ownership is NOT recorded here — the external registry is the sole
/// source of truth and is consulted live on every authorization check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,

    /// Free-text description set by the owner.
    pub description: String,

    /// Collateral currently staked behind this group.
    pub staked: u128,

    /// Capacity ceiling derived from the stake and the owner's vote share.
    /// Recomputed on every stake change, never retroactively.
    pub capacity: u128,

    /// Per-group minimum first-join amount. The effective minimum is the
    /// larger of this and the global minimum.
    pub min_join_amount: Option<u128>,

    /// Per-group cap on one account's cumulative joined amount.
    pub max_join_amount: Option<u128>,

    /// Cap on the member count.
    pub max_members: Option<usize>,

    pub lifecycle: GroupLifecycle,

    /// Round of the most recent activation.
    pub activated_in: Round,

    /// Round of deactivation, while deactivated.
    pub deactivated_in: Option<Round>,

    /// Sum of all members' current contributions.
    pub total_joined: u128,

    /// Per-round record of `total_joined` (score weighting reads this).
    pub joined_history: RoundHistory<u128>,

    /// All-time joined total. Survives deactivation and re-activation.
    pub all_time_joined: u128,
}

impl GroupInfo {
    /// Effective first-join minimum given the global floor.
    pub fn effective_min_join(&self, global_min: u128) -> u128 {
        self.min_join_amount.unwrap_or(0).max(global_min)
    }
}

/// One account's join record.
///
/// Created on first join, amount grows on subsequent joins to the same
/// group, fully cleared on exit — there are no partial states.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinInfo {
    /// The joined group.
    pub group: GroupId,

    /// Cumulative contributed amount.
    pub amount: u128,

    /// Round of the first join.
    pub joined_in: Round,

    /// Per-round record of the cumulative amount (score weighting reads this).
    pub amount_history: RoundHistory<u128>,
}
