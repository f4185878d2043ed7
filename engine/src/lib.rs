//! COHORT engine facade.
//!
//! Composes the capacity, join, scoring, and reward components over the
//! embedder-supplied collaborators (ownership registry, asset ledger,
//! governance ledger, round oracle, reward minter) and exposes the full
//! state-mutating and read-only surface of the engine.

pub mod engine;
pub mod error;
mod guard;

pub use engine::{CohortEngine, Collaborators};
pub use error::EngineError;
