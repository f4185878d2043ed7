//! Fundamental types for the COHORT engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, group identities, rounds, fixed-point arithmetic,
//! the round-keyed history log, engine parameters, and lifecycle enums.

pub mod address;
pub mod fixed;
pub mod group;
pub mod history;
pub mod params;
pub mod round;
pub mod state;

pub use address::Address;
pub use fixed::{bps_of, mul_div, mul_div_checked, BPS_DENOM, UNIT};
pub use group::GroupId;
pub use history::{HistoryError, RoundHistory};
pub use params::{EngineParams, ParamsError};
pub use round::Round;
pub use state::GroupLifecycle;
