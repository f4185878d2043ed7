//! Scoring-specific errors.

use cohort_types::{Address, GroupId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("{caller} is neither the owner of {group} nor its valid delegate")]
    NotVerifier { caller: Address, group: GroupId },

    #[error("cannot delegate to oneself")]
    SelfDelegation,

    #[error("no delegation recorded for {0}")]
    NoDelegation(GroupId),

    #[error("{0} is already finalized this round")]
    AlreadyFinalized(GroupId),

    #[error("batch starts at {got}, expected {expected}")]
    BatchOutOfSequence { expected: usize, got: usize },

    #[error("batch of {batch} starting at {start} runs past the {roster}-member roster")]
    BatchBeyondRoster {
        start: usize,
        batch: usize,
        roster: usize,
    },

    #[error("batch must contain at least one score")]
    EmptyBatch,

    #[error("{0} has no members to score")]
    EmptyRoster(GroupId),

    #[error("score {0} is outside [0, 100]")]
    ScoreOutOfRange(u64),

    #[error("{owner} has no verification capacity left this round")]
    NoVerifyCapacity { owner: Address },

    #[error("distrust amount must be non-zero")]
    ZeroDistrust,

    #[error("distrust reason must not be empty")]
    EmptyReason,

    #[error("cumulative distrust {cumulative} exceeds the voter's weight {weight}")]
    DistrustExceedsWeight { cumulative: u128, weight: u128 },
}
