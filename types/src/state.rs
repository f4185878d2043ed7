//! Lifecycle enums for groups and score records.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupLifecycle {
    /// Known to the ownership registry but never activated here.
    Pending,
    /// Activated with staked collateral; accepts joins and scoring.
    Active,
    /// Deactivated by its owner; joins blocked, exits still allowed.
    /// Terminal until re-activated.
    Deactivated,
}

impl GroupLifecycle {
    /// Whether accounts may join a group in this state.
    pub fn accepts_joins(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the group's members may be scored this round.
    pub fn accepts_scoring(&self) -> bool {
        matches!(self, Self::Active)
    }
}
