//! The reward distributor.

use crate::error::RewardError;
use cohort_types::{mul_div, Address, EngineParams, GroupId, Round, BPS_DENOM, UNIT};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One configured payout recipient: a fixed `UNIT`-scaled cut of every
/// minted claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecipient {
    pub address: Address,
    /// Cut of the minted amount, `UNIT`-scaled. All ratios together sum to
    /// at most `UNIT`; the remainder of every claim goes to the claimant.
    pub ratio: u128,
}

/// Immutable snapshot of a settled claim.
///
/// Before claiming, a reward is a pure function of round state; once
/// claimed, this record is the permanent answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardRecord {
    /// The owner that claimed.
    pub claimant: Address,
    /// Amount actually paid out (claimant remainder + recipient cuts).
    pub minted: u128,
    /// Excess over the governance-ratio cap, burned instead of paid.
    pub burned: u128,
    /// Per-recipient cuts of `minted`, in configured order.
    pub recipient_cuts: Vec<(Address, u128)>,
    /// What the claimant themselves received (minted − Σ cuts).
    pub claimant_amount: u128,
}

/// Per-round reward accounting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardDistributor {
    params: EngineParams,
    /// Memoized pool totals — fixed on first access, whatever the minter
    /// would answer later.
    pools: HashMap<Round, u128>,
    /// Rounds whose unclaimed pool was burned, with the burned amount.
    burned_pools: HashMap<Round, u128>,
    /// Settled claims.
    claims: HashMap<(Round, GroupId), RewardRecord>,
    /// Configured payout fan-out.
    recipients: Vec<PayoutRecipient>,
}

impl RewardDistributor {
    pub fn new(params: EngineParams) -> Self {
        Self {
            params,
            pools: HashMap::new(),
            burned_pools: HashMap::new(),
            claims: HashMap::new(),
            recipients: Vec::new(),
        }
    }

    // ── Configuration ────────────────────────────────────────────────────

    /// Configure the payout fan-out. Replaces any previous configuration.
    pub fn set_payout_recipients(
        &mut self,
        recipients: Vec<PayoutRecipient>,
    ) -> Result<(), RewardError> {
        if recipients.len() > self.params.max_payout_recipients {
            return Err(RewardError::TooManyRecipients {
                count: recipients.len(),
                max: self.params.max_payout_recipients,
            });
        }
        let mut seen = HashSet::new();
        let mut sum = 0u128;
        for r in &recipients {
            if r.ratio == 0 {
                return Err(RewardError::ZeroRatioRecipient(r.address.clone()));
            }
            if !seen.insert(&r.address) {
                return Err(RewardError::DuplicateRecipient(r.address.clone()));
            }
            sum = sum.saturating_add(r.ratio);
        }
        if sum > UNIT {
            return Err(RewardError::RatioSumAboveUnit { sum });
        }
        self.recipients = recipients;
        Ok(())
    }

    pub fn payout_recipients(&self) -> &[PayoutRecipient] {
        &self.recipients
    }

    // ── Pool memoization ─────────────────────────────────────────────────

    /// The memoized pool for `round`, if already fixed.
    pub fn pool(&self, round: Round) -> Option<u128> {
        self.pools.get(&round).copied()
    }

    /// Fix the pool for `round`. A second record for the same round is
    /// ignored — the first answer wins (the facade only calls the minter
    /// when no pool is memoized yet).
    pub fn record_pool(&mut self, round: Round, amount: u128) -> u128 {
        *self.pools.entry(round).or_insert(amount)
    }

    // ── Shares and claims ────────────────────────────────────────────────

    /// The uncapped proportional share: `pool × score / total`, 0 when
    /// either score or pool is 0.
    pub fn theoretical_share(pool: u128, score: u128, total_score: u128) -> u128 {
        if score == 0 || pool == 0 {
            return 0;
        }
        mul_div(pool, score, total_score)
    }

    /// Split a theoretical share into (minted, burned) under the
    /// governance-ratio cap. `owner_gov_ratio` is `UNIT`-scaled.
    pub fn capped_split(&self, theoretical: u128, pool: u128, owner_gov_ratio: u128) -> (u128, u128) {
        if self.params.max_distribution_ratio_bps == 0 {
            return (theoretical, 0);
        }
        let cap = mul_div(
            mul_div(pool, owner_gov_ratio, UNIT),
            self.params.max_distribution_ratio_bps as u128,
            BPS_DENOM,
        );
        let minted = theoretical.min(cap);
        (minted, theoretical - minted)
    }

    /// Settle the one-shot claim for `(round, group)`.
    ///
    /// The facade has already verified the round is closed, the group
    /// finalized, and `claimant` is the group's current owner; it supplies
    /// the score figures, the memoized pool, and the owner's `UNIT`-scaled
    /// governance ratio. The minted/burned split and the per-recipient cuts
    /// are computed once here and frozen into the stored record.
    pub fn claim(
        &mut self,
        round: Round,
        group: GroupId,
        claimant: Address,
        group_score: u128,
        round_total_score: u128,
        pool: u128,
        owner_gov_ratio: u128,
    ) -> Result<&RewardRecord, RewardError> {
        let key = (round, group);
        if self.claims.contains_key(&key) {
            return Err(RewardError::AlreadyClaimed { round, group });
        }

        let theoretical = Self::theoretical_share(pool, group_score, round_total_score);
        if theoretical == 0 {
            return Err(RewardError::NothingToClaim { round, group });
        }
        let (minted, burned) = self.capped_split(theoretical, pool, owner_gov_ratio);

        let mut recipient_cuts = Vec::with_capacity(self.recipients.len());
        let mut distributed = 0u128;
        for r in &self.recipients {
            let cut = mul_div(minted, r.ratio, UNIT);
            distributed += cut;
            recipient_cuts.push((r.address.clone(), cut));
        }

        let record = RewardRecord {
            claimant,
            minted,
            burned,
            recipient_cuts,
            claimant_amount: minted - distributed,
        };
        Ok(self.claims.entry(key).or_insert(record))
    }

    /// Undo a just-recorded claim — facade-only hook for the
    /// transfer-failed abort path.
    pub fn revert_claim(&mut self, round: Round, group: GroupId) {
        self.claims.remove(&(round, group));
    }

    /// Burn the whole pool of a scoreless closed round.
    ///
    /// Idempotent: a second burn of the same round is a no-op returning 0.
    /// The facade verifies the round is closed and nothing finalized.
    pub fn burn_unclaimed(&mut self, round: Round, pool: u128) -> u128 {
        if self.burned_pools.contains_key(&round) {
            return 0;
        }
        self.burned_pools.insert(round, pool);
        pool
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// The settled claim record, if the group has claimed this round.
    pub fn claim_record(&self, round: Round, group: GroupId) -> Option<&RewardRecord> {
        self.claims.get(&(round, group))
    }

    pub fn is_claimed(&self, round: Round, group: GroupId) -> bool {
        self.claims.contains_key(&(round, group))
    }

    /// Amount burned for a scoreless round, if its pool was burned.
    pub fn burned_pool(&self, round: Round) -> Option<u128> {
        self.burned_pools.get(&round).copied()
    }
}
