//! Join-ledger errors.

use cohort_types::GroupId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("account already belongs to {0}")]
    AlreadyInOtherGroup(GroupId),

    #[error("account has no join record")]
    NotJoined,

    #[error("{0} not found")]
    GroupNotFound(GroupId),

    #[error("{0} is not active")]
    GroupNotActive(GroupId),

    #[error("{0} is already active")]
    GroupAlreadyActive(GroupId),

    #[error("first join of {amount} is below the {minimum} minimum")]
    BelowMinimumJoin { amount: u128, minimum: u128 },

    #[error("{0} is full ({1} members)")]
    GroupFull(GroupId, usize),

    #[error("cumulative amount {cumulative} exceeds the group maximum {maximum}")]
    AboveGroupMaximum { cumulative: u128, maximum: u128 },

    #[error("cumulative amount {cumulative} exceeds the action-wide cap {cap}")]
    AboveActionCap { cumulative: u128, cap: u128 },

    #[error("join would raise {group} to {total}, above its {capacity} capacity")]
    GroupCapacityExceeded {
        group: GroupId,
        total: u128,
        capacity: u128,
    },

    #[error("capacity {capacity} is below the {joined} already joined to {group}")]
    CapacityBelowJoined {
        group: GroupId,
        capacity: u128,
        joined: u128,
    },

    #[error("min join amount {min} exceeds max join amount {max}")]
    InconsistentJoinLimits { min: u128, max: u128 },

    #[error("member cap {cap} is below the current member count {count}")]
    MemberCapBelowCount { cap: usize, count: usize },

    #[error("round bookkeeping error: {0}")]
    History(#[from] cohort_types::HistoryError),
}
