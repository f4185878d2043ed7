//! Nullable round oracle — deterministic round progression for testing.

use cohort_externals::RoundOracle;
use cohort_types::Round;
use std::sync::Mutex;

/// A deterministic round counter.
///
/// Rounds only advance when you tell them to, and never go backwards.
pub struct NullRoundOracle {
    current: Mutex<Round>,
}

impl NullRoundOracle {
    pub fn new(initial: Round) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Advance to the next round.
    pub fn advance(&self) {
        let mut current = self.current.lock().unwrap();
        *current = current.next();
    }

    /// Jump forward to `round`. Moving backwards is ignored.
    pub fn set(&self, round: Round) {
        let mut current = self.current.lock().unwrap();
        if round > *current {
            *current = round;
        }
    }
}

impl Default for NullRoundOracle {
    fn default() -> Self {
        Self::new(Round::GENESIS)
    }
}

impl RoundOracle for NullRoundOracle {
    fn current_round(&self) -> Round {
        *self.current.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_and_never_rewinds() {
        let oracle = NullRoundOracle::new(Round::new(5));
        oracle.advance();
        assert_eq!(oracle.current_round(), Round::new(6));

        oracle.set(Round::new(10));
        assert_eq!(oracle.current_round(), Round::new(10));

        oracle.set(Round::new(3));
        assert_eq!(oracle.current_round(), Round::new(10));
    }
}
