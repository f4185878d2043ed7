//! Nullable collaborators for deterministic testing.
//!
//! Follows the "A-frame architecture" pattern: every external service the
//! engine consults (ownership registry, asset ledger, governance ledger,
//! round oracle, reward minter) is abstracted behind a trait in
//! `cohort-externals`. This crate provides test-friendly implementations
//! that:
//! - Return deterministic, programmable values
//! - Record the calls made against them
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod governance;
pub mod ledger;
pub mod minter;
pub mod oracle;
pub mod registry;

pub use governance::NullGovernanceLedger;
pub use ledger::{NullAssetLedger, TransferEntry};
pub use minter::NullRewardMinter;
pub use oracle::NullRoundOracle;
pub use registry::NullOwnershipRegistry;
