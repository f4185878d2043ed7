//! Abstract collaborator interfaces consumed by the COHORT engine.
//!
//! The engine never owns group identities, asset balances, governance votes,
//! the round counter, or reward issuance — those are externally supplied
//! services consulted through these traits. Production embedders wire real
//! implementations; tests use the `cohort-nullables` doubles.

use cohort_types::{Address, GroupId, Round};
use thiserror::Error;

/// Errors surfaced by the asset transfer primitive.
///
/// Any asset failure aborts the whole engine operation that triggered it.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance for {owner}: need {needed}")]
    InsufficientAllowance { owner: Address, needed: u128 },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// The non-fungible ownership registry that assigns group identities.
///
/// The sole source of truth for "who owns this group" — the engine never
/// caches or overrides it.
pub trait OwnershipRegistry {
    /// The current owner of a group, if the identity exists.
    fn owner_of(&self, group: GroupId) -> Option<Address>;

    /// Number of group identities held by `owner`.
    fn group_count(&self, owner: &Address) -> usize;

    /// Enumerate `owner`'s group identities by index.
    fn group_at_index(&self, owner: &Address, index: usize) -> Option<GroupId>;
}

/// The fungible asset used for staking and joining.
pub trait AssetLedger {
    /// Move `amount` from the engine's own holdings to `to`.
    fn transfer(&self, to: &Address, amount: u128) -> Result<(), AssetError>;

    /// Pull `amount` from `from` into `to` (the engine, for stakes/joins).
    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<(), AssetError>;

    /// Total asset supply (capacity arithmetic baseline).
    fn total_supply(&self) -> u128;
}

/// The governance vote/stake ledger.
pub trait GovernanceLedger {
    /// Votes currently held by `account`.
    fn valid_votes(&self, account: &Address) -> u128;

    /// Total votes outstanding.
    fn total_votes(&self) -> u128;
}

/// The round-advancement oracle.
pub trait RoundOracle {
    /// The current round — monotonically non-decreasing across calls.
    fn current_round(&self) -> Round;
}

/// The reward-minting collaborator.
pub trait RewardMinter {
    /// The total reward pool for `round`. Expected to be stable once
    /// answered for a given round (the engine memoizes it regardless).
    fn mint_reward_for_round(&self, round: Round) -> u128;
}
