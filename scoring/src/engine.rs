//! The verification engine — batch accumulation, finalization, distrust.

use crate::delegation::DelegationTable;
use crate::error::ScoringError;
use crate::state::{DistrustRecord, ScoreState, MAX_SCORE};
use cohort_types::{mul_div, Address, GroupId, Round, UNIT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of an accepted score batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Batch recorded; more members remain.
    Accepted { scored: usize, remaining: usize },
    /// The batch completed the roster and the group finalized.
    Finalized {
        group_score: u128,
        reduction_factor: u128,
    },
}

/// Everything one round accumulates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RoundLedger {
    /// Score state per group.
    scores: HashMap<GroupId, ScoreState>,
    /// Finalization order.
    finalized: Vec<GroupId>,
    /// Owner (at finalization time) → that owner's finalized groups.
    finalized_by_owner: HashMap<Address, Vec<GroupId>>,
    /// Owner → Σ round-joined totals of groups finalized under them.
    /// This doubles as the owner's verification weight for the round.
    verify_weight: HashMap<Address, u128>,
    /// Σ of all verification weights.
    total_verify_weight: u128,
    /// Σ of all stored group scores. Kept exact through rescales.
    total_score: u128,
    /// (voter, target owner) → cumulative distrust record.
    distrust: HashMap<(Address, Address), DistrustRecord>,
    /// Target owner → total distrust weight against them.
    distrust_by_owner: HashMap<Address, u128>,
}

/// The verification engine.
///
/// Pure state machine: the facade resolves the current owner through the
/// ownership registry, snapshots rosters from the join ledger, and reads
/// owner verification capacity from the capacity manager. Everything keyed
/// by round accumulates here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationEngine {
    rounds: HashMap<Round, RoundLedger>,
    delegations: DelegationTable,
}

impl VerificationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Delegation ───────────────────────────────────────────────────────

    /// Record a delegation granted by `owner` for `group`.
    pub fn set_delegate(
        &mut self,
        group: GroupId,
        owner: Address,
        delegate: Address,
    ) -> Result<(), ScoringError> {
        if owner == delegate {
            return Err(ScoringError::SelfDelegation);
        }
        self.delegations.set(group, owner, delegate);
        Ok(())
    }

    pub fn clear_delegate(&mut self, group: GroupId) -> Result<(), ScoringError> {
        if !self.delegations.clear(group) {
            return Err(ScoringError::NoDelegation(group));
        }
        Ok(())
    }

    pub fn delegation(&self, group: GroupId) -> Option<&crate::delegation::Delegation> {
        self.delegations.get(group)
    }

    // ── Scoring ──────────────────────────────────────────────────────────

    /// Submit a batch of member scores for `(round, group)`.
    ///
    /// `caller` must be the current owner or a still-valid delegate.
    /// `roster` is the join ledger's round roster, used only when this is
    /// the first batch for the pair. `owner_verify_capacity` caps how much
    /// contribution the owner may verify this round.
    ///
    /// Batches are strictly sequential: `start` must equal the number of
    /// members already scored, and the batch may not run past the roster.
    /// The batch that reaches the roster size finalizes the group; if the
    /// owner has no verification capacity left, that entire batch is
    /// rejected (no partial success).
    #[allow(clippy::too_many_arguments)]
    pub fn submit_batch(
        &mut self,
        round: Round,
        group: GroupId,
        caller: &Address,
        current_owner: &Address,
        start: usize,
        scores: &[u64],
        roster: &[(Address, u128)],
        owner_verify_capacity: u128,
    ) -> Result<BatchOutcome, ScoringError> {
        if !self.delegations.is_authorized(group, caller, current_owner) {
            return Err(ScoringError::NotVerifier {
                caller: caller.clone(),
                group,
            });
        }
        if scores.is_empty() {
            return Err(ScoringError::EmptyBatch);
        }
        if let Some(&bad) = scores.iter().find(|s| **s > MAX_SCORE) {
            return Err(ScoringError::ScoreOutOfRange(bad));
        }

        let ledger = self.rounds.entry(round).or_default();
        if ledger.scores.get(&group).is_some_and(|s| s.finalized) {
            return Err(ScoringError::AlreadyFinalized(group));
        }

        // Every check runs before the first batch snapshots the roster, so
        // a rejected batch leaves no state at all behind.
        let (roster_len, scored) = match ledger.scores.get(&group) {
            Some(state) => (state.roster.len(), state.scored),
            None => {
                if roster.is_empty() {
                    return Err(ScoringError::EmptyRoster(group));
                }
                (roster.len(), 0)
            }
        };
        if start != scored {
            return Err(ScoringError::BatchOutOfSequence {
                expected: scored,
                got: start,
            });
        }
        if start + scores.len() > roster_len {
            return Err(ScoringError::BatchBeyondRoster {
                start,
                batch: scores.len(),
                roster: roster_len,
            });
        }

        let will_finalize = start + scores.len() == roster_len;
        if will_finalize {
            let consumed = ledger
                .verify_weight
                .get(current_owner)
                .copied()
                .unwrap_or(0);
            if owner_verify_capacity.saturating_sub(consumed) == 0 {
                return Err(ScoringError::NoVerifyCapacity {
                    owner: current_owner.clone(),
                });
            }
        }

        let state = ledger
            .scores
            .entry(group)
            .or_insert_with(|| ScoreState::new(group, roster.to_vec()));
        let mut batch_score = 0u128;
        for (score, (_, amount)) in scores.iter().zip(state.roster[start..].iter()) {
            let weighted = (*score as u128).saturating_mul(*amount);
            state.member_scores.push(weighted);
            batch_score = batch_score.saturating_add(weighted);
        }
        state.raw_score = state.raw_score.saturating_add(batch_score);
        state.scored += scores.len();

        if !will_finalize {
            return Ok(BatchOutcome::Accepted {
                scored: state.scored,
                remaining: roster_len - state.scored,
            });
        }

        // ── Finalization ─────────────────────────────────────────────────
        let contribution = state.contribution;
        let raw_score = state.raw_score;

        let consumed = ledger
            .verify_weight
            .get(current_owner)
            .copied()
            .unwrap_or(0);
        let remaining = owner_verify_capacity.saturating_sub(consumed);
        let reduction_factor = if contribution == 0 || remaining >= contribution {
            UNIT
        } else {
            mul_div(remaining, UNIT, contribution)
        };

        // The group's contribution counts toward verification weight before
        // the discount is evaluated, so the very first finalizer discounts
        // against a non-zero total too.
        *ledger.verify_weight.entry(current_owner.clone()).or_insert(0) += contribution;
        ledger.total_verify_weight += contribution;

        let distrust = ledger
            .distrust_by_owner
            .get(current_owner)
            .copied()
            .unwrap_or(0);
        let group_score = scaled_score(
            raw_score,
            ledger.total_verify_weight,
            distrust,
            reduction_factor,
        );

        let state = ledger
            .scores
            .get_mut(&group)
            .ok_or(ScoringError::EmptyRoster(group))?;
        state.finalized = true;
        state.verifier = Some(caller.clone());
        state.reduction_factor = reduction_factor;
        state.group_score = group_score;

        ledger.finalized.push(group);
        ledger
            .finalized_by_owner
            .entry(current_owner.clone())
            .or_default()
            .push(group);
        ledger.total_score += group_score;

        Ok(BatchOutcome::Finalized {
            group_score,
            reduction_factor,
        })
    }

    // ── Distrust ─────────────────────────────────────────────────────────

    /// Cast `weight` of distrust from `voter` against `target_owner`.
    ///
    /// The voter's cumulative distrust against one owner is bounded by the
    /// voter's own verification weight this round. Every already-finalized
    /// group of the target owner is rescaled in place with the new distrust
    /// total and its *frozen* reduction factor; the round total score is
    /// adjusted by the exact deltas.
    pub fn cast_distrust(
        &mut self,
        round: Round,
        voter: &Address,
        target_owner: &Address,
        weight: u128,
        reason: &str,
    ) -> Result<(), ScoringError> {
        if weight == 0 {
            return Err(ScoringError::ZeroDistrust);
        }
        if reason.trim().is_empty() {
            return Err(ScoringError::EmptyReason);
        }

        let ledger = self.rounds.entry(round).or_default();
        let voter_weight = ledger.verify_weight.get(voter).copied().unwrap_or(0);
        let key = (voter.clone(), target_owner.clone());
        let cumulative = ledger
            .distrust
            .get(&key)
            .map(|r| r.weight)
            .unwrap_or(0)
            .saturating_add(weight);
        if cumulative > voter_weight {
            return Err(ScoringError::DistrustExceedsWeight {
                cumulative,
                weight: voter_weight,
            });
        }

        let record = ledger.distrust.entry(key).or_default();
        record.weight = cumulative;
        record.reasons.push(reason.to_string());
        let total_against = ledger
            .distrust_by_owner
            .entry(target_owner.clone())
            .or_insert(0);
        *total_against += weight;
        let distrust = *total_against;

        // Retroactive rescale of the target's finalized groups.
        let affected = ledger
            .finalized_by_owner
            .get(target_owner)
            .cloned()
            .unwrap_or_default();
        let total_weight = ledger.total_verify_weight;
        for group in affected {
            if let Some(state) = ledger.scores.get_mut(&group) {
                let new_score = scaled_score(
                    state.raw_score,
                    total_weight,
                    distrust,
                    state.reduction_factor,
                );
                ledger.total_score = ledger.total_score - state.group_score + new_score;
                state.group_score = new_score;
            }
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn score_state(&self, round: Round, group: GroupId) -> Option<&ScoreState> {
        self.rounds.get(&round)?.scores.get(&group)
    }

    /// The account's slice of its group's scoring this round:
    /// `(group, member's weighted score, group raw score)`. `None` when the
    /// account is on no scored roster.
    pub fn account_share(&self, round: Round, account: &Address) -> Option<(GroupId, u128, u128)> {
        let ledger = self.rounds.get(&round)?;
        for (group, state) in &ledger.scores {
            if let Some(index) = state.roster.iter().position(|(a, _)| a == account) {
                let weighted = state.member_scores.get(index).copied().unwrap_or(0);
                return Some((*group, weighted, state.raw_score));
            }
        }
        None
    }

    /// The group's stored (distrust-adjusted) score, 0 if not finalized.
    pub fn group_score(&self, round: Round, group: GroupId) -> u128 {
        self.score_state(round, group)
            .filter(|s| s.finalized)
            .map(|s| s.group_score)
            .unwrap_or(0)
    }

    pub fn round_total_score(&self, round: Round) -> u128 {
        self.rounds.get(&round).map(|l| l.total_score).unwrap_or(0)
    }

    /// Groups finalized this round, in finalization order.
    pub fn finalized_groups(&self, round: Round) -> &[GroupId] {
        self.rounds
            .get(&round)
            .map(|l| l.finalized.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any group finalized this round (reward burn gate).
    pub fn any_finalized(&self, round: Round) -> bool {
        !self.finalized_groups(round).is_empty()
    }

    /// The round's verifiers and the groups each one finalized.
    pub fn round_verifiers(&self, round: Round) -> Vec<(Address, Vec<GroupId>)> {
        let Some(ledger) = self.rounds.get(&round) else {
            return Vec::new();
        };
        let mut by_verifier: HashMap<&Address, Vec<GroupId>> = HashMap::new();
        for group in &ledger.finalized {
            if let Some(verifier) = ledger.scores.get(group).and_then(|s| s.verifier.as_ref()) {
                by_verifier.entry(verifier).or_default().push(*group);
            }
        }
        let mut out: Vec<(Address, Vec<GroupId>)> = by_verifier
            .into_iter()
            .map(|(v, gs)| (v.clone(), gs))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// An owner's verification weight this round (Σ finalized contributions).
    pub fn verify_weight(&self, round: Round, owner: &Address) -> u128 {
        self.rounds
            .get(&round)
            .and_then(|l| l.verify_weight.get(owner))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_verify_weight(&self, round: Round) -> u128 {
        self.rounds
            .get(&round)
            .map(|l| l.total_verify_weight)
            .unwrap_or(0)
    }

    /// Cumulative distrust cast by `voter` against `owner` this round.
    pub fn distrust_between(&self, round: Round, voter: &Address, owner: &Address) -> u128 {
        self.rounds
            .get(&round)
            .and_then(|l| l.distrust.get(&(voter.clone(), owner.clone())))
            .map(|r| r.weight)
            .unwrap_or(0)
    }

    /// Total distrust weight against `owner` this round.
    pub fn distrust_against(&self, round: Round, owner: &Address) -> u128 {
        self.rounds
            .get(&round)
            .and_then(|l| l.distrust_by_owner.get(owner))
            .copied()
            .unwrap_or(0)
    }

    /// The distrust record (weight + reasons) for a voter/owner pair.
    pub fn distrust_record(
        &self,
        round: Round,
        voter: &Address,
        owner: &Address,
    ) -> Option<&DistrustRecord> {
        self.rounds
            .get(&round)?
            .distrust
            .get(&(voter.clone(), owner.clone()))
    }
}

/// `raw × (total − distrust) / total × factor / UNIT`, with the discount
/// skipped entirely when there is no verification weight to discount
/// against.
fn scaled_score(raw: u128, total_weight: u128, distrust: u128, factor: u128) -> u128 {
    let discounted = if total_weight == 0 {
        raw
    } else {
        mul_div(raw, total_weight.saturating_sub(distrust), total_weight)
    };
    mul_div(discounted, factor, UNIT)
}
