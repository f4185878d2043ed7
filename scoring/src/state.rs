//! Per-(round, group) score state and distrust records.

use cohort_types::{Address, GroupId, UNIT};
use serde::{Deserialize, Serialize};

/// The maximum accepted quality score.
pub const MAX_SCORE: u64 = 100;

/// Scoring phase of one group in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScorePhase {
    /// No batch accepted yet.
    Pending,
    /// Some, but not all, members scored.
    PartiallyScored,
    /// Every member scored; the group score is recorded.
    Finalized,
}

/// Accumulated scoring state for one group in one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreState {
    pub group: GroupId,

    /// Member roster snapshotted from the join ledger on the first batch:
    /// `(account, round-joined amount)`, in member-list order. Joins and
    /// exits later in the round do not move the goalposts mid-scoring.
    pub roster: Vec<(Address, u128)>,

    /// The group's round-joined asset total (sum of roster amounts). This
    /// is the "contribution" capacity arithmetic runs on.
    pub contribution: u128,

    /// Accumulated weighted raw score: Σ score_i × amount_i.
    pub raw_score: u128,

    /// Per-member weighted scores (`score_i × amount_i`), parallel to
    /// `roster` up to `scored`. The basis for account-level reward slices.
    pub member_scores: Vec<u128>,

    /// Members scored so far. Batches must continue exactly here.
    pub scored: usize,

    /// Whether the group has finalized this round.
    pub finalized: bool,

    /// The caller who submitted the finalizing batch (owner or delegate).
    pub verifier: Option<Address>,

    /// Capacity-reduction factor applied at finalization, `UNIT`-scaled.
    /// Frozen once set — distrust rescales reuse it, never recompute it.
    pub reduction_factor: u128,

    /// The stored, distrust-adjusted group score.
    pub group_score: u128,
}

impl ScoreState {
    pub fn new(group: GroupId, roster: Vec<(Address, u128)>) -> Self {
        let contribution = roster.iter().map(|(_, amount)| amount).sum();
        Self {
            group,
            roster,
            contribution,
            raw_score: 0,
            member_scores: Vec::new(),
            scored: 0,
            finalized: false,
            verifier: None,
            reduction_factor: UNIT,
            group_score: 0,
        }
    }

    pub fn phase(&self) -> ScorePhase {
        if self.finalized {
            ScorePhase::Finalized
        } else if self.scored > 0 {
            ScorePhase::PartiallyScored
        } else {
            ScorePhase::Pending
        }
    }
}

/// Cumulative distrust cast by one voter against one owner in one round.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DistrustRecord {
    /// Cumulative distrust weight, bounded by the voter's own verification
    /// weight for the round.
    pub weight: u128,

    /// The reasons given, one per cast vote.
    pub reasons: Vec<String>,
}
