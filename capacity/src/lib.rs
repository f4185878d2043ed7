//! Capacity ceilings for the COHORT engine.
//!
//! Converts a group owner's governance-vote share and staked collateral into
//! participation capacity: an owner-wide ceiling, a per-group ceiling, and a
//! vote-weighted cap on individual join amounts.
//!
//! The manager is pure arithmetic over readings the facade takes from the
//! governance/asset collaborators — it holds no collaborator handles and no
//! mutable state beyond the immutable parameters.

pub mod error;
pub mod manager;

pub use error::CapacityError;
pub use manager::CapacityManager;
