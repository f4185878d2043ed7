//! The COHORT facade.
//!
//! Owns the four component engines and the collaborator handles, performs
//! every authorization check against the live ownership registry, and is the
//! only place asset transfers happen. Entry points follow checks-effects-
//! interactions: all validation and state mutation complete before any
//! transfer is issued, and a failed transfer is answered with the exact
//! inverse mutation before the error propagates.

use crate::error::EngineError;
use crate::guard::CallGuard;
use cohort_capacity::CapacityManager;
use cohort_externals::{
    AssetLedger, GovernanceLedger, OwnershipRegistry, RewardMinter, RoundOracle,
};
use cohort_joins::{GroupInfo, JoinInfo, JoinLedger};
use cohort_rewards::{PayoutRecipient, RewardDistributor, RewardRecord};
use cohort_scoring::{BatchOutcome, ScoreState, VerificationEngine};
use cohort_types::{mul_div, Address, EngineParams, GroupId, Round, UNIT};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// External collaborator handles the engine consults but never owns.
pub struct Collaborators {
    pub registry: Rc<dyn OwnershipRegistry>,
    pub assets: Rc<dyn AssetLedger>,
    pub governance: Rc<dyn GovernanceLedger>,
    pub rounds: Rc<dyn RoundOracle>,
    pub minter: Rc<dyn RewardMinter>,
}

/// Serializable snapshot of the engine's own state.
///
/// Collaborator handles and the pure capacity arithmetic are rebuilt from
/// the embedder's wiring on restore.
#[derive(Serialize, Deserialize)]
struct EngineSnapshot {
    params: EngineParams,
    joins: JoinLedger,
    scoring: VerificationEngine,
    rewards: RewardDistributor,
}

pub struct CohortEngine {
    params: EngineParams,
    capacity: CapacityManager,
    joins: JoinLedger,
    scoring: VerificationEngine,
    rewards: RewardDistributor,
    collaborators: Collaborators,
    /// The engine's own asset account, holding stakes and joined amounts.
    vault: Address,
    /// The governance identity whose vote share scales the per-account
    /// join ceiling for this deployment.
    action_identity: Address,
    in_progress: Cell<bool>,
}

impl CohortEngine {
    pub fn new(
        params: EngineParams,
        collaborators: Collaborators,
        vault: Address,
        action_identity: Address,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            capacity: CapacityManager::new(params.clone()),
            joins: JoinLedger::new(params.clone()),
            scoring: VerificationEngine::new(),
            rewards: RewardDistributor::new(params.clone()),
            params,
            collaborators,
            vault,
            action_identity,
            in_progress: Cell::new(false),
        })
    }

    fn current_round(&self) -> Round {
        self.collaborators.rounds.current_round()
    }

    fn owner_of(&self, group: GroupId) -> Result<Address, EngineError> {
        self.collaborators
            .registry
            .owner_of(group)
            .ok_or(EngineError::UnknownGroup { group })
    }

    fn require_owner(&self, caller: &Address, group: GroupId) -> Result<Address, EngineError> {
        let owner = self.owner_of(group)?;
        if owner != *caller {
            return Err(EngineError::NotOwner {
                caller: caller.clone(),
                group,
            });
        }
        Ok(owner)
    }

    /// Stake and capacity consumed by `owner`'s *other* active groups.
    fn owner_stake_and_consumed(&self, owner: &Address, excluding: GroupId) -> (u128, u128) {
        let registry = &self.collaborators.registry;
        let mut staked = 0u128;
        let mut consumed = 0u128;
        for index in 0..registry.group_count(owner) {
            let Some(id) = registry.group_at_index(owner, index) else {
                continue;
            };
            if id == excluding {
                continue;
            }
            if let Some(info) = self.joins.group(id) {
                if info.lifecycle.accepts_joins() {
                    staked = staked.saturating_add(info.staked);
                    consumed = consumed.saturating_add(info.capacity);
                }
            }
        }
        (staked, consumed)
    }

    fn owner_capacity_of(&self, owner: &Address) -> u128 {
        let supply = self.collaborators.assets.total_supply();
        let votes = self.collaborators.governance.valid_votes(owner);
        let total = self.collaborators.governance.total_votes();
        self.capacity.owner_capacity(supply, votes, total)
    }

    /// `owner_votes × UNIT / total_votes`, 0 when no votes are outstanding.
    fn owner_gov_ratio(&self, owner: &Address) -> u128 {
        let votes = self.collaborators.governance.valid_votes(owner);
        let total = self.collaborators.governance.total_votes();
        if votes == 0 || total == 0 {
            return 0;
        }
        mul_div(votes, UNIT, total)
    }

    /// The memoized pool for `round`, minting it on first access.
    ///
    /// Takes the fields apart so callers holding the re-entrancy guard
    /// (a borrow of `in_progress`) can still memoize.
    fn pool_for(
        rewards: &mut RewardDistributor,
        minter: &Rc<dyn RewardMinter>,
        round: Round,
    ) -> u128 {
        match rewards.pool(round) {
            Some(pool) => pool,
            None => {
                let minted = minter.mint_reward_for_round(round);
                rewards.record_pool(round, minted)
            }
        }
    }

    // ── Group lifecycle ──────────────────────────────────────────────────

    /// Activate (or re-activate) `group` with `staked` collateral pulled
    /// from `caller`.
    pub fn activate_group(
        &mut self,
        caller: &Address,
        group: GroupId,
        staked: u128,
        description: String,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        let round = self.current_round();

        let supply = self.collaborators.assets.total_supply();
        let votes = self.collaborators.governance.valid_votes(caller);
        let total_votes = self.collaborators.governance.total_votes();
        let (other_staked, consumed) = self.owner_stake_and_consumed(caller, group);
        self.capacity.check_activation(
            staked,
            supply,
            votes,
            total_votes,
            other_staked.saturating_add(staked),
        )?;

        let owner_cap = self.capacity.owner_capacity(supply, votes, total_votes);
        let group_cap = self.capacity.group_capacity(staked, owner_cap, consumed);

        let before = self.joins.snapshot_group(group);
        self.joins.activate(group, staked, group_cap, description, round)?;

        if let Err(e) = self
            .collaborators
            .assets
            .transfer_from(caller, &self.vault, staked)
        {
            self.joins.restore_group(group, before);
            tracing::warn!(group = %group, "stake transfer failed: {e}");
            return Err(e.into());
        }
        tracing::debug!(group = %group, staked, capacity = group_cap, "group activated");
        Ok(())
    }

    /// Add `additional` stake to an active group, raising its capacity.
    pub fn expand_group_stake(
        &mut self,
        caller: &Address,
        group: GroupId,
        additional: u128,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;

        let current = self
            .joins
            .group(group)
            .ok_or(cohort_joins::JoinError::GroupNotFound(group))?;
        let new_staked = current.staked.saturating_add(additional);

        let supply = self.collaborators.assets.total_supply();
        let votes = self.collaborators.governance.valid_votes(caller);
        let total_votes = self.collaborators.governance.total_votes();
        let (other_staked, consumed) = self.owner_stake_and_consumed(caller, group);
        self.capacity.check_activation(
            new_staked,
            supply,
            votes,
            total_votes,
            other_staked.saturating_add(new_staked),
        )?;

        let owner_cap = self.capacity.owner_capacity(supply, votes, total_votes);
        let new_capacity = self.capacity.group_capacity(new_staked, owner_cap, consumed);

        let before = self.joins.snapshot_group(group);
        self.joins.expand_stake(group, additional, new_capacity)?;

        if let Err(e) = self
            .collaborators
            .assets
            .transfer_from(caller, &self.vault, additional)
        {
            self.joins.restore_group(group, before);
            return Err(e.into());
        }
        tracing::debug!(group = %group, additional, capacity = new_capacity, "stake expanded");
        Ok(())
    }

    pub fn update_group_description(
        &mut self,
        caller: &Address,
        group: GroupId,
        description: String,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        self.joins.update_description(group, description)?;
        Ok(())
    }

    pub fn set_group_join_limits(
        &mut self,
        caller: &Address,
        group: GroupId,
        min: Option<u128>,
        max: Option<u128>,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        self.joins.set_join_limits(group, min, max)?;
        Ok(())
    }

    pub fn set_group_max_members(
        &mut self,
        caller: &Address,
        group: GroupId,
        cap: Option<usize>,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        self.joins.set_max_members(group, cap)?;
        Ok(())
    }

    /// Deactivate `group`, returning its staked collateral to the owner.
    /// Joins are blocked afterwards; members may still exit.
    pub fn deactivate_group(
        &mut self,
        caller: &Address,
        group: GroupId,
    ) -> Result<u128, EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        let round = self.current_round();

        let before = self.joins.snapshot_group(group);
        let refund = self.joins.deactivate(group, round)?;

        if refund > 0 {
            if let Err(e) = self.collaborators.assets.transfer(caller, refund) {
                self.joins.restore_group(group, before);
                return Err(e.into());
            }
        }
        tracing::debug!(group = %group, refund, "group deactivated");
        Ok(refund)
    }

    // ── Membership ───────────────────────────────────────────────────────

    /// Join `group` with `amount` of the join asset pulled from `caller`.
    pub fn join(
        &mut self,
        caller: &Address,
        group: GroupId,
        amount: u128,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        let round = self.current_round();

        let supply = self.collaborators.assets.total_supply();
        let action_votes = self
            .collaborators
            .governance
            .valid_votes(&self.action_identity);
        let total_votes = self.collaborators.governance.total_votes();
        let action_cap = self
            .capacity
            .max_join_amount_for_action(supply, action_votes, total_votes);

        self.joins.join(caller, group, amount, action_cap, round)?;

        if let Err(e) = self
            .collaborators
            .assets
            .transfer_from(caller, &self.vault, amount)
        {
            self.joins.revert_join(caller, amount, round);
            tracing::warn!(account = %caller, group = %group, "join transfer failed: {e}");
            return Err(e.into());
        }
        tracing::debug!(account = %caller, group = %group, amount, "joined");
        Ok(())
    }

    /// Exit the joined group, refunding the full contributed amount.
    pub fn exit(&mut self, caller: &Address) -> Result<u128, EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        let round = self.current_round();

        let (group, refund) = self.joins.exit(caller, round)?;

        if refund > 0 {
            if let Err(e) = self.collaborators.assets.transfer(caller, refund) {
                self.joins.revert_exit(caller, group, refund, round);
                return Err(e.into());
            }
        }
        tracing::debug!(account = %caller, group = %group, refund, "exited");
        Ok(refund)
    }

    // ── Verification ─────────────────────────────────────────────────────

    /// Delegate scoring authority for `group` to `delegate`.
    ///
    /// The delegation records the granting owner and silently expires if
    /// the registry later reports a different owner.
    pub fn set_delegate(
        &mut self,
        caller: &Address,
        group: GroupId,
        delegate: Address,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        let owner = self.require_owner(caller, group)?;
        self.scoring.set_delegate(group, owner, delegate)?;
        Ok(())
    }

    pub fn clear_delegate(&mut self, caller: &Address, group: GroupId) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        self.require_owner(caller, group)?;
        self.scoring.clear_delegate(group)?;
        Ok(())
    }

    /// Submit a strictly sequential batch of member scores for `group` in
    /// the current round. The batch completing the roster finalizes the
    /// group.
    pub fn submit_scores(
        &mut self,
        caller: &Address,
        group: GroupId,
        start: usize,
        scores: &[u64],
    ) -> Result<BatchOutcome, EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        let round = self.current_round();
        let owner = self.owner_of(group)?;

        let info = self
            .joins
            .group(group)
            .ok_or(cohort_joins::JoinError::GroupNotFound(group))?;
        if !info.lifecycle.accepts_scoring() {
            return Err(cohort_joins::JoinError::GroupNotActive(group).into());
        }

        let roster = self.joins.roster_at(group, round);
        let verify_capacity = self.owner_capacity_of(&owner);

        let outcome = self.scoring.submit_batch(
            round,
            group,
            caller,
            &owner,
            start,
            scores,
            &roster,
            verify_capacity,
        )?;
        if let BatchOutcome::Finalized {
            group_score,
            reduction_factor,
        } = outcome
        {
            tracing::debug!(
                group = %group,
                round = %round,
                group_score,
                reduction_factor,
                "group finalized"
            );
        }
        Ok(outcome)
    }

    /// Cast `weight` of distrust against `target_owner` in the current
    /// round, retroactively rescaling that owner's finalized scores.
    pub fn cast_distrust(
        &mut self,
        caller: &Address,
        target_owner: &Address,
        weight: u128,
        reason: &str,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        let round = self.current_round();
        self.scoring
            .cast_distrust(round, caller, target_owner, weight, reason)?;
        tracing::debug!(voter = %caller, target = %target_owner, weight, "distrust cast");
        Ok(())
    }

    // ── Rewards ──────────────────────────────────────────────────────────

    /// Claim the reward for `(round, group)`. One-shot per pair; the round
    /// must be closed and `caller` must be the group's current owner.
    pub fn claim_reward(
        &mut self,
        caller: &Address,
        round: Round,
        group: GroupId,
    ) -> Result<RewardRecord, EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        if self.current_round() <= round {
            return Err(cohort_rewards::RewardError::RoundStillOpen(round).into());
        }
        self.require_owner(caller, group)?;

        let group_score = self.scoring.group_score(round, group);
        let round_total = self.scoring.round_total_score(round);
        let pool = Self::pool_for(&mut self.rewards, &self.collaborators.minter, round);
        let gov_ratio = self.owner_gov_ratio(caller);

        let record = self
            .rewards
            .claim(
                round,
                group,
                caller.clone(),
                group_score,
                round_total,
                pool,
                gov_ratio,
            )?
            .clone();

        if let Err((issued, e)) = self.pay_out(&record) {
            if issued == 0 {
                // Nothing moved: the claim never happened.
                self.rewards.revert_claim(round, group);
            }
            // Otherwise the claim stands — assets already left the engine,
            // so a revert would let the round be claimed again.
            tracing::warn!(group = %group, round = %round, issued, "reward payout failed: {e}");
            return Err(e);
        }
        tracing::debug!(
            group = %group,
            round = %round,
            minted = record.minted,
            burned = record.burned,
            "reward claimed"
        );
        Ok(record)
    }

    /// Issue the claim's transfers, recipient cuts first, the claimant's
    /// remainder last. On failure, reports how many transfers had already
    /// been issued.
    fn pay_out(&self, record: &RewardRecord) -> Result<(), (usize, EngineError)> {
        let mut issued = 0usize;
        for (recipient, cut) in &record.recipient_cuts {
            if *cut > 0 {
                self.collaborators
                    .assets
                    .transfer(recipient, *cut)
                    .map_err(|e| (issued, e.into()))?;
                issued += 1;
            }
        }
        if record.claimant_amount > 0 {
            self.collaborators
                .assets
                .transfer(&record.claimant, record.claimant_amount)
                .map_err(|e| (issued, e.into()))?;
        }
        Ok(())
    }

    /// Configure the payout fan-out applied to every future claim.
    pub fn set_payout_recipients(
        &mut self,
        recipients: Vec<PayoutRecipient>,
    ) -> Result<(), EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        // The distributor validates ratios and duplicates; the engine's own
        // account is only known here.
        if let Some(own) = recipients.iter().find(|r| r.address == self.vault) {
            return Err(
                cohort_rewards::RewardError::SelfReferentialRecipient(own.address.clone()).into(),
            );
        }
        self.rewards.set_payout_recipients(recipients)?;
        Ok(())
    }

    /// Burn the whole pool of a closed round in which nothing finalized.
    /// Open to any caller; idempotent.
    pub fn burn_round_pool(&mut self, round: Round) -> Result<u128, EngineError> {
        let _guard = CallGuard::acquire(&self.in_progress)?;
        if self.current_round() <= round {
            return Err(cohort_rewards::RewardError::RoundStillOpen(round).into());
        }
        if self.scoring.any_finalized(round) {
            return Err(cohort_rewards::RewardError::RoundHasScores(round).into());
        }
        let pool = Self::pool_for(&mut self.rewards, &self.collaborators.minter, round);
        let burned = self.rewards.burn_unclaimed(round, pool);
        if burned > 0 {
            tracing::debug!(round = %round, burned, "unclaimed pool burned");
        }
        Ok(burned)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupInfo> {
        self.joins.group(id)
    }

    pub fn join_info(&self, account: &Address) -> Option<&JoinInfo> {
        self.joins.join_info(account)
    }

    pub fn members(&self, id: GroupId) -> &[Address] {
        self.joins.members(id)
    }

    pub fn member_count(&self, id: GroupId) -> usize {
        self.joins.member_count(id)
    }

    pub fn joined_amount_at(&self, account: &Address, round: Round) -> u128 {
        self.joins.joined_amount_at(account, round)
    }

    pub fn group_total_at(&self, id: GroupId, round: Round) -> u128 {
        self.joins.group_total_at(id, round)
    }

    pub fn score_state(&self, round: Round, group: GroupId) -> Option<&ScoreState> {
        self.scoring.score_state(round, group)
    }

    pub fn group_score(&self, round: Round, group: GroupId) -> u128 {
        self.scoring.group_score(round, group)
    }

    pub fn round_total_score(&self, round: Round) -> u128 {
        self.scoring.round_total_score(round)
    }

    pub fn finalized_groups(&self, round: Round) -> &[GroupId] {
        self.scoring.finalized_groups(round)
    }

    pub fn round_verifiers(&self, round: Round) -> Vec<(Address, Vec<GroupId>)> {
        self.scoring.round_verifiers(round)
    }

    pub fn verify_weight(&self, round: Round, owner: &Address) -> u128 {
        self.scoring.verify_weight(round, owner)
    }

    pub fn distrust_against(&self, round: Round, owner: &Address) -> u128 {
        self.scoring.distrust_against(round, owner)
    }

    /// The reward a group would receive (or did receive) for `round`.
    ///
    /// Claimed pairs answer from the frozen record; unclaimed pairs are a
    /// pure function of current round state. Only a memoized pool is
    /// consulted — the minter is never called from the query path, so the
    /// answer is 0 until the round's pool has been fixed by a claim or burn.
    pub fn reward_for(&self, round: Round, group: GroupId) -> u128 {
        if let Some(record) = self.rewards.claim_record(round, group) {
            return record.minted;
        }
        let Some(pool) = self.rewards.pool(round) else {
            return 0;
        };
        let theoretical = RewardDistributor::theoretical_share(
            pool,
            self.scoring.group_score(round, group),
            self.scoring.round_total_score(round),
        );
        match self.collaborators.registry.owner_of(group) {
            Some(owner) => {
                let (minted, _) =
                    self.rewards
                        .capped_split(theoretical, pool, self.owner_gov_ratio(&owner));
                minted
            }
            None => theoretical,
        }
    }

    /// The slice of its group's reward attributable to one member for
    /// `round`: the group reward scaled by the member's share of the
    /// weighted raw score.
    pub fn reward_for_account(&self, round: Round, account: &Address) -> u128 {
        let Some((group, weighted, raw_score)) = self.scoring.account_share(round, account)
        else {
            return 0;
        };
        if raw_score == 0 {
            return 0;
        }
        mul_div(self.reward_for(round, group), weighted, raw_score)
    }

    pub fn claim_record(&self, round: Round, group: GroupId) -> Option<&RewardRecord> {
        self.rewards.claim_record(round, group)
    }

    pub fn is_claimed(&self, round: Round, group: GroupId) -> bool {
        self.rewards.is_claimed(round, group)
    }

    pub fn round_pool(&self, round: Round) -> Option<u128> {
        self.rewards.pool(round)
    }

    pub fn burned_pool(&self, round: Round) -> Option<u128> {
        self.rewards.burned_pool(round)
    }

    pub fn owner_capacity(&self, owner: &Address) -> u128 {
        self.owner_capacity_of(owner)
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the engine's own state to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = EngineSnapshot {
            params: self.params.clone(),
            joins: self.joins.clone(),
            scoring: self.scoring.clone(),
            rewards: self.rewards.clone(),
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore an engine from a `save_state` snapshot, re-wired to fresh
    /// collaborator handles. Undecodable bytes restore an empty engine with
    /// the supplied params.
    pub fn load_state(
        data: &[u8],
        params: EngineParams,
        collaborators: Collaborators,
        vault: Address,
        action_identity: Address,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        let snapshot: Option<EngineSnapshot> = bincode::deserialize(data).ok();
        let mut engine = Self::new(params, collaborators, vault, action_identity)?;
        if let Some(snapshot) = snapshot {
            engine.capacity = CapacityManager::new(snapshot.params.clone());
            engine.params = snapshot.params;
            engine.joins = snapshot.joins;
            engine.scoring = snapshot.scoring;
            engine.rewards = snapshot.rewards;
        }
        Ok(engine)
    }
}
