//! Reward distributor — proportional per-round payouts.
//!
//! Each round's pool is memoized on first access from the reward-minting
//! collaborator. A group's share is proportional to its finalized score; an
//! optional governance-ratio cap limits the minted portion (excess burned).
//! Claims are one-shot per (round, group) and fan a fixed-ratio cut out to
//! configured recipients, the remainder going to the claimant.

pub mod distributor;
pub mod error;

pub use distributor::{PayoutRecipient, RewardDistributor, RewardRecord};
pub use error::RewardError;
