//! Round type — the external epoch counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An accounting round.
///
/// Rounds are advanced by an external oracle and are monotonically
/// non-decreasing over a deployment's lifetime. All joins, scores, distrust
/// votes, and rewards are keyed by round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Round(u64);

impl Round {
    /// Round zero (before the first advance).
    pub const GENESIS: Self = Self(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The round immediately after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.0)
    }
}
