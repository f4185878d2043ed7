//! Round-keyed append-only history log.

use crate::round::Round;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot record at {attempted} — history already at {latest}")]
    BackwardsRecord { attempted: Round, latest: Round },
}

/// An append-only record of a value's successive per-round states.
///
/// Entries are stored ONCE per round; recording twice in the same round
/// replaces that round's value (the round is still "current", nothing past
/// is touched). Recorded rounds are strictly increasing otherwise — a
/// record at an earlier round is rejected.
///
/// A query for round R answers with the most recent value recorded at a
/// round ≤ R, via binary search — O(log n), n = number of distinct rounds
/// the value actually changed (typically small).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundHistory<T> {
    entries: Vec<(Round, T)>,
}

impl<T> Default for RoundHistory<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> RoundHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as of `round`.
    ///
    /// Same-round records replace the latest entry; earlier rounds are
    /// rejected — past entries are never rewritten.
    pub fn record(&mut self, round: Round, value: T) -> Result<(), HistoryError> {
        match self.entries.last_mut() {
            Some((latest, slot)) if *latest == round => {
                *slot = value;
                Ok(())
            }
            Some((latest, _)) if *latest > round => Err(HistoryError::BackwardsRecord {
                attempted: round,
                latest: *latest,
            }),
            _ => {
                self.entries.push((round, value));
                Ok(())
            }
        }
    }

    /// The most recent value recorded at a round ≤ `round`, if any.
    pub fn value_at(&self, round: Round) -> Option<&T> {
        let idx = self.entries.partition_point(|(r, _)| *r <= round);
        if idx == 0 {
            None
        } else {
            Some(&self.entries[idx - 1].1)
        }
    }

    /// The most recent value recorded at a round ≤ `round`, cloned, or
    /// `default` if nothing was recorded that early.
    pub fn value_at_or(&self, round: Round, default: T) -> T {
        self.value_at(round).cloned().unwrap_or(default)
    }

    /// The latest recorded value, if any.
    pub fn latest(&self) -> Option<&T> {
        self.entries.last().map(|(_, v)| v)
    }

    /// The round of the latest record, if any.
    pub fn latest_round(&self) -> Option<Round> {
        self.entries.last().map(|(r, _)| *r)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
