//! Join ledger — group lifecycle and round-versioned membership accounting.
//!
//! Tracks which account belongs to which group and how much it has
//! contributed, enforcing the per-account, per-group, and action-wide
//! ceilings at join time. Membership is kept as dense swap-remove lists so
//! enumeration is O(current size); the per-account `JoinInfo` map stays
//! authoritative and the lists are a provably consistent index over it.

pub mod error;
pub mod ledger;
pub mod types;

pub use error::JoinError;
pub use ledger::JoinLedger;
pub use types::{GroupInfo, JoinInfo};
