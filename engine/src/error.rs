use cohort_types::{Address, GroupId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("capacity error: {0}")]
    Capacity(#[from] cohort_capacity::CapacityError),

    #[error("join error: {0}")]
    Join(#[from] cohort_joins::JoinError),

    #[error("scoring error: {0}")]
    Scoring(#[from] cohort_scoring::ScoringError),

    #[error("reward error: {0}")]
    Reward(#[from] cohort_rewards::RewardError),

    #[error("asset error: {0}")]
    Asset(#[from] cohort_externals::AssetError),

    #[error("params error: {0}")]
    Params(#[from] cohort_types::ParamsError),

    #[error("re-entrant call rejected")]
    ReentrantCall,

    #[error("group {group} has no registered owner")]
    UnknownGroup { group: GroupId },

    #[error("{caller} is not the owner of group {group}")]
    NotOwner { caller: Address, group: GroupId },
}
