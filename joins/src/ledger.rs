//! The join ledger — lifecycle, joins, exits, and membership indexes.

use crate::error::JoinError;
use crate::types::{GroupInfo, JoinInfo};
use cohort_types::{Address, EngineParams, GroupId, GroupLifecycle, Round, RoundHistory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Round-versioned record of group membership and contributions.
///
/// The `joins` map is the authoritative account → group record. The dense
/// `members` lists (with `member_index` back-pointers) exist so member
/// enumeration and removal are O(current size), maintained with swap-remove.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JoinLedger {
    params: EngineParams,
    groups: HashMap<GroupId, GroupInfo>,
    joins: HashMap<Address, JoinInfo>,
    /// Dense per-group member lists.
    members: HashMap<GroupId, Vec<Address>>,
    /// account → its position in the group's member list.
    member_index: HashMap<Address, usize>,
}

impl JoinLedger {
    pub fn new(params: EngineParams) -> Self {
        Self {
            params,
            groups: HashMap::new(),
            joins: HashMap::new(),
            members: HashMap::new(),
            member_index: HashMap::new(),
        }
    }

    // ── Group lifecycle ──────────────────────────────────────────────────

    /// Activate a new group, or re-activate a deactivated one.
    ///
    /// Re-activation resets the lifecycle fields but keeps the all-time
    /// joined total and any members still holding contributions. The new
    /// capacity must cover whatever is still joined.
    pub fn activate(
        &mut self,
        id: GroupId,
        staked: u128,
        capacity: u128,
        description: String,
        round: Round,
    ) -> Result<(), JoinError> {
        if let Some(existing) = self.groups.get(&id) {
            if existing.lifecycle == GroupLifecycle::Active {
                return Err(JoinError::GroupAlreadyActive(id));
            }
            if capacity < existing.total_joined {
                return Err(JoinError::CapacityBelowJoined {
                    group: id,
                    capacity,
                    joined: existing.total_joined,
                });
            }
        }

        let entry = self.groups.entry(id).or_insert_with(|| GroupInfo {
            id,
            description: String::new(),
            staked: 0,
            capacity: 0,
            min_join_amount: None,
            max_join_amount: None,
            max_members: None,
            lifecycle: GroupLifecycle::Pending,
            activated_in: round,
            deactivated_in: None,
            total_joined: 0,
            joined_history: RoundHistory::new(),
            all_time_joined: 0,
        });
        entry.description = description;
        entry.staked = staked;
        entry.capacity = capacity;
        entry.min_join_amount = None;
        entry.max_join_amount = None;
        entry.max_members = None;
        entry.lifecycle = GroupLifecycle::Active;
        entry.activated_in = round;
        entry.deactivated_in = None;
        Ok(())
    }

    /// Add stake to an active group and apply its recomputed capacity.
    pub fn expand_stake(
        &mut self,
        id: GroupId,
        additional: u128,
        new_capacity: u128,
    ) -> Result<(), JoinError> {
        if additional == 0 {
            return Err(JoinError::ZeroAmount);
        }
        let group = self.active_group_mut(id)?;
        group.staked = group.staked.saturating_add(additional);
        group.capacity = new_capacity;
        Ok(())
    }

    pub fn update_description(&mut self, id: GroupId, description: String) -> Result<(), JoinError> {
        self.active_group_mut(id)?.description = description;
        Ok(())
    }

    /// Set the per-group join bounds. `min > max` is rejected outright.
    pub fn set_join_limits(
        &mut self,
        id: GroupId,
        min: Option<u128>,
        max: Option<u128>,
    ) -> Result<(), JoinError> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(JoinError::InconsistentJoinLimits { min: lo, max: hi });
            }
        }
        let group = self.active_group_mut(id)?;
        group.min_join_amount = min;
        group.max_join_amount = max;
        Ok(())
    }

    /// Cap the member count. The cap may not undercut the current roster.
    pub fn set_max_members(&mut self, id: GroupId, cap: Option<usize>) -> Result<(), JoinError> {
        let count = self.member_count(id);
        if let Some(c) = cap {
            if c < count {
                return Err(JoinError::MemberCapBelowCount { cap: c, count });
            }
        }
        self.active_group_mut(id)?.max_members = cap;
        Ok(())
    }

    /// Deactivate an active group. Returns the stake to refund.
    ///
    /// Joins are blocked from here on; members keep their contributions and
    /// may still exit. Terminal until re-activated.
    pub fn deactivate(&mut self, id: GroupId, round: Round) -> Result<u128, JoinError> {
        let group = self.active_group_mut(id)?;
        let refund = group.staked;
        group.staked = 0;
        group.capacity = 0;
        group.lifecycle = GroupLifecycle::Deactivated;
        group.deactivated_in = Some(round);
        Ok(refund)
    }

    /// Put a group record back to a previously captured state — facade-only
    /// hook for the transfer-failed abort path of lifecycle operations.
    /// `previous` is the record as it stood before the operation (`None`
    /// when the group did not exist yet).
    pub fn restore_group(&mut self, id: GroupId, previous: Option<GroupInfo>) {
        match previous {
            Some(info) => {
                self.groups.insert(id, info);
            }
            None => {
                self.groups.remove(&id);
            }
        }
    }

    /// Clone the current group record for a later `restore_group`.
    pub fn snapshot_group(&self, id: GroupId) -> Option<GroupInfo> {
        self.groups.get(&id).cloned()
    }

    // ── Joining and exiting ──────────────────────────────────────────────

    /// Join `group` with `amount`, subject to the full validation chain.
    ///
    /// `action_cap` is the vote-weighted per-account ceiling computed by the
    /// facade for this round. Validation runs in a fixed order and nothing
    /// is mutated unless every check passes.
    pub fn join(
        &mut self,
        account: &Address,
        group_id: GroupId,
        amount: u128,
        action_cap: u128,
        round: Round,
    ) -> Result<(), JoinError> {
        if amount == 0 {
            return Err(JoinError::ZeroAmount);
        }

        let existing = self.joins.get(account);
        if let Some(info) = existing {
            if info.group != group_id {
                return Err(JoinError::AlreadyInOtherGroup(info.group));
            }
        }

        let group = self
            .groups
            .get(&group_id)
            .ok_or(JoinError::GroupNotFound(group_id))?;
        if !group.lifecycle.accepts_joins() {
            return Err(JoinError::GroupNotActive(group_id));
        }

        let first_join = existing.is_none();
        if first_join {
            let minimum = group.effective_min_join(self.params.min_join_amount);
            if amount < minimum {
                return Err(JoinError::BelowMinimumJoin { amount, minimum });
            }
            let count = self.member_count(group_id);
            if let Some(cap) = group.max_members {
                if count >= cap {
                    return Err(JoinError::GroupFull(group_id, count));
                }
            }
        }

        let cumulative = existing.map(|i| i.amount).unwrap_or(0).saturating_add(amount);
        if let Some(maximum) = group.max_join_amount {
            if cumulative > maximum {
                return Err(JoinError::AboveGroupMaximum { cumulative, maximum });
            }
        }
        if cumulative > action_cap {
            return Err(JoinError::AboveActionCap {
                cumulative,
                cap: action_cap,
            });
        }

        let new_total = group.total_joined.saturating_add(amount);
        if new_total > group.capacity {
            return Err(JoinError::GroupCapacityExceeded {
                group: group_id,
                total: new_total,
                capacity: group.capacity,
            });
        }

        // All checks passed — mutate.
        let info = self.joins.entry(account.clone()).or_insert_with(|| JoinInfo {
            group: group_id,
            amount: 0,
            joined_in: round,
            amount_history: RoundHistory::new(),
        });
        info.amount = cumulative;
        info.amount_history.record(round, cumulative)?;

        if first_join {
            let list = self.members.entry(group_id).or_default();
            self.member_index.insert(account.clone(), list.len());
            list.push(account.clone());
        }

        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(JoinError::GroupNotFound(group_id))?;
        group.total_joined = new_total;
        group.all_time_joined = group.all_time_joined.saturating_add(amount);
        group.joined_history.record(round, new_total)?;
        Ok(())
    }

    /// Undo a just-applied join — facade-only hook for the transfer-failed
    /// abort path. Must be called with the exact arguments of the join it
    /// reverts, in the same round, before any other mutation.
    pub fn revert_join(&mut self, account: &Address, amount: u128, round: Round) {
        let Some(info) = self.joins.get_mut(account) else {
            return;
        };
        let group_id = info.group;
        info.amount = info.amount.saturating_sub(amount);
        if info.amount == 0 && info.joined_in == round {
            self.joins.remove(account);
            self.remove_member(account, group_id);
        } else {
            let restored = info.amount;
            // Same-round re-record replaces the entry the join wrote.
            let _ = info.amount_history.record(round, restored);
        }
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.total_joined = group.total_joined.saturating_sub(amount);
            group.all_time_joined = group.all_time_joined.saturating_sub(amount);
            let total = group.total_joined;
            let _ = group.joined_history.record(round, total);
        }
    }

    /// Exit the joined group entirely. Returns `(group, refund)`.
    ///
    /// All-or-nothing: the full contributed amount is returned and the join
    /// record cleared. Allowed while the group is deactivated.
    pub fn exit(&mut self, account: &Address, round: Round) -> Result<(GroupId, u128), JoinError> {
        let info = self.joins.remove(account).ok_or(JoinError::NotJoined)?;
        let group_id = info.group;
        let refund = info.amount;

        self.remove_member(account, group_id);

        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(JoinError::GroupNotFound(group_id))?;
        group.total_joined = group.total_joined.saturating_sub(refund);
        let total = group.total_joined;
        group.joined_history.record(round, total)?;
        Ok((group_id, refund))
    }

    /// Undo a just-applied exit — facade-only hook for the transfer-failed
    /// abort path.
    pub fn revert_exit(&mut self, account: &Address, group_id: GroupId, refund: u128, round: Round) {
        let info = self.joins.entry(account.clone()).or_insert_with(|| JoinInfo {
            group: group_id,
            amount: 0,
            joined_in: round,
            amount_history: RoundHistory::new(),
        });
        info.amount = refund;
        let _ = info.amount_history.record(round, refund);

        if !self.member_index.contains_key(account) {
            let list = self.members.entry(group_id).or_default();
            self.member_index.insert(account.clone(), list.len());
            list.push(account.clone());
        }
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.total_joined = group.total_joined.saturating_add(refund);
            let total = group.total_joined;
            let _ = group.joined_history.record(round, total);
        }
    }

    /// Swap-remove `account` from its group's dense member list.
    fn remove_member(&mut self, account: &Address, group_id: GroupId) {
        let Some(idx) = self.member_index.remove(account) else {
            return;
        };
        let Some(list) = self.members.get_mut(&group_id) else {
            return;
        };
        list.swap_remove(idx);
        if let Some(moved) = list.get(idx) {
            self.member_index.insert(moved.clone(), idx);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn group(&self, id: GroupId) -> Option<&GroupInfo> {
        self.groups.get(&id)
    }

    pub fn join_info(&self, account: &Address) -> Option<&JoinInfo> {
        self.joins.get(account)
    }

    pub fn members(&self, id: GroupId) -> &[Address] {
        self.members.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_count(&self, id: GroupId) -> usize {
        self.members.get(&id).map(Vec::len).unwrap_or(0)
    }

    /// An account's cumulative joined amount as of `round`.
    pub fn joined_amount_at(&self, account: &Address, round: Round) -> u128 {
        self.joins
            .get(account)
            .map(|i| i.amount_history.value_at_or(round, 0))
            .unwrap_or(0)
    }

    /// A group's joined total as of `round`.
    pub fn group_total_at(&self, id: GroupId, round: Round) -> u128 {
        self.groups
            .get(&id)
            .map(|g| g.joined_history.value_at_or(round, 0))
            .unwrap_or(0)
    }

    /// The round's member roster with per-account round amounts, for score
    /// weighting. Order matches the dense member list.
    pub fn roster_at(&self, id: GroupId, round: Round) -> Vec<(Address, u128)> {
        self.members(id)
            .iter()
            .map(|a| (a.clone(), self.joined_amount_at(a, round)))
            .collect()
    }

    /// Verify the membership indexes against the authoritative join map.
    /// The lists are an optimization, never a second source of truth.
    pub fn check_consistency(&self) -> bool {
        let listed: usize = self.members.values().map(Vec::len).sum();
        if listed != self.joins.len() || listed != self.member_index.len() {
            return false;
        }
        self.joins.iter().all(|(account, info)| {
            self.member_index
                .get(account)
                .and_then(|&idx| self.members.get(&info.group).and_then(|l| l.get(idx)))
                .is_some_and(|entry| entry == account)
        }) && self.groups.iter().all(|(id, g)| {
            let sum: u128 = self
                .members(*id)
                .iter()
                .filter_map(|a| self.joins.get(a))
                .map(|i| i.amount)
                .sum();
            sum == g.total_joined
        })
    }

    fn active_group_mut(&mut self, id: GroupId) -> Result<&mut GroupInfo, JoinError> {
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(JoinError::GroupNotFound(id))?;
        if group.lifecycle != GroupLifecycle::Active {
            return Err(JoinError::GroupNotActive(id));
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(n: u8) -> Address {
        Address::new(format!("acct_{n:02}"))
    }

    fn test_group(n: u64) -> GroupId {
        GroupId::new(n)
    }

    fn r(n: u64) -> Round {
        Round::new(n)
    }

    fn ledger_with_group(capacity: u128) -> JoinLedger {
        let mut l = JoinLedger::new(EngineParams::cohort_defaults());
        l.activate(test_group(1), 200, capacity, "test group".into(), r(1))
            .unwrap();
        l
    }

    const CAP: u128 = u128::MAX / 4; // effectively uncapped action ceiling

    #[test]
    fn join_creates_record_and_membership() {
        let mut l = ledger_with_group(1000);
        l.join(&test_address(1), test_group(1), 400, CAP, r(1)).unwrap();

        let info = l.join_info(&test_address(1)).unwrap();
        assert_eq!(info.group, test_group(1));
        assert_eq!(info.amount, 400);
        assert_eq!(info.joined_in, r(1));
        assert_eq!(l.members(test_group(1)), &[test_address(1)]);
        assert_eq!(l.group(test_group(1)).unwrap().total_joined, 400);
        assert!(l.check_consistency());
    }

    #[test]
    fn repeat_join_accumulates_same_group_only() {
        let mut l = ledger_with_group(1000);
        l.activate(test_group(2), 200, 1000, "other".into(), r(1)).unwrap();
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();
        l.join(&test_address(1), test_group(1), 150, CAP, r(2)).unwrap();

        assert_eq!(l.join_info(&test_address(1)).unwrap().amount, 250);
        // Still a single membership entry.
        assert_eq!(l.member_count(test_group(1)), 1);

        let err = l
            .join(&test_address(1), test_group(2), 100, CAP, r(2))
            .unwrap_err();
        assert!(matches!(err, JoinError::AlreadyInOtherGroup(g) if g == test_group(1)));
    }

    #[test]
    fn joins_fill_capacity_exactly() {
        // capacity 1000: 400 + 500 ok, +200 fails, exit 400, then 200 ok.
        let mut l = ledger_with_group(1000);
        l.join(&test_address(1), test_group(1), 400, CAP, r(1)).unwrap();
        l.join(&test_address(2), test_group(1), 500, CAP, r(1)).unwrap();

        let err = l
            .join(&test_address(3), test_group(1), 200, CAP, r(1))
            .unwrap_err();
        assert!(matches!(err, JoinError::GroupCapacityExceeded { total: 1100, .. }));

        let (group, refund) = l.exit(&test_address(1), r(1)).unwrap();
        assert_eq!(group, test_group(1));
        assert_eq!(refund, 400);

        l.join(&test_address(3), test_group(1), 200, CAP, r(1)).unwrap();
        assert_eq!(l.group(test_group(1)).unwrap().total_joined, 700);
        assert!(l.check_consistency());
    }

    #[test]
    fn first_join_minimum_and_member_cap() {
        let mut l = ledger_with_group(10_000);
        l.set_join_limits(test_group(1), Some(50), None).unwrap();

        let err = l
            .join(&test_address(1), test_group(1), 49, CAP, r(1))
            .unwrap_err();
        assert!(matches!(err, JoinError::BelowMinimumJoin { minimum: 50, .. }));

        l.join(&test_address(1), test_group(1), 50, CAP, r(1)).unwrap();
        // Top-ups below the first-join minimum are fine.
        l.join(&test_address(1), test_group(1), 1, CAP, r(1)).unwrap();

        l.set_max_members(test_group(1), Some(2)).unwrap();
        l.join(&test_address(2), test_group(1), 60, CAP, r(1)).unwrap();
        let err = l
            .join(&test_address(3), test_group(1), 60, CAP, r(1))
            .unwrap_err();
        assert!(matches!(err, JoinError::GroupFull(_, 2)));
    }

    #[test]
    fn group_maximum_and_action_cap() {
        let mut l = ledger_with_group(10_000);
        l.set_join_limits(test_group(1), None, Some(300)).unwrap();

        l.join(&test_address(1), test_group(1), 250, CAP, r(1)).unwrap();
        let err = l
            .join(&test_address(1), test_group(1), 51, CAP, r(1))
            .unwrap_err();
        assert!(matches!(err, JoinError::AboveGroupMaximum { cumulative: 301, maximum: 300 }));

        let err = l
            .join(&test_address(2), test_group(1), 200, 150, r(1))
            .unwrap_err();
        assert!(matches!(err, JoinError::AboveActionCap { cumulative: 200, cap: 150 }));
    }

    #[test]
    fn exit_clears_everything_and_swap_removes() {
        let mut l = ledger_with_group(10_000);
        for n in 1..=3 {
            l.join(&test_address(n), test_group(1), 100, CAP, r(1)).unwrap();
        }
        l.exit(&test_address(1), r(2)).unwrap();

        assert!(l.join_info(&test_address(1)).is_none());
        assert_eq!(l.member_count(test_group(1)), 2);
        // The last member was swapped into the vacated slot.
        assert_eq!(l.members(test_group(1))[0], test_address(3));
        assert!(l.check_consistency());

        assert!(matches!(l.exit(&test_address(1), r(2)), Err(JoinError::NotJoined)));
    }

    #[test]
    fn deactivation_blocks_joins_but_not_exits() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();

        let refund = l.deactivate(test_group(1), r(2)).unwrap();
        assert_eq!(refund, 200);
        let g = l.group(test_group(1)).unwrap();
        assert_eq!(g.lifecycle, GroupLifecycle::Deactivated);
        assert_eq!(g.deactivated_in, Some(r(2)));

        let err = l
            .join(&test_address(2), test_group(1), 100, CAP, r(2))
            .unwrap_err();
        assert!(matches!(err, JoinError::GroupNotActive(_)));

        let (_, refund) = l.exit(&test_address(1), r(2)).unwrap();
        assert_eq!(refund, 100);
    }

    #[test]
    fn reactivation_keeps_all_time_totals() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();
        l.exit(&test_address(1), r(1)).unwrap();
        l.deactivate(test_group(1), r(2)).unwrap();

        l.activate(test_group(1), 300, 1500, "again".into(), r(3)).unwrap();
        let g = l.group(test_group(1)).unwrap();
        assert_eq!(g.lifecycle, GroupLifecycle::Active);
        assert_eq!(g.activated_in, r(3));
        assert_eq!(g.deactivated_in, None);
        assert_eq!(g.staked, 300);
        assert_eq!(g.total_joined, 0);
        assert_eq!(g.all_time_joined, 100);
    }

    #[test]
    fn reactivation_capacity_must_cover_remaining_joins() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 500, CAP, r(1)).unwrap();
        l.deactivate(test_group(1), r(2)).unwrap();

        let err = l
            .activate(test_group(1), 50, 400, "again".into(), r(3))
            .unwrap_err();
        assert!(matches!(err, JoinError::CapacityBelowJoined { joined: 500, .. }));
        assert!(l.activate(test_group(1), 100, 500, "again".into(), r(3)).is_ok());
    }

    #[test]
    fn round_history_answers_past_rounds() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(2)).unwrap();
        l.join(&test_address(1), test_group(1), 150, CAP, r(4)).unwrap();

        assert_eq!(l.joined_amount_at(&test_address(1), r(1)), 0);
        assert_eq!(l.joined_amount_at(&test_address(1), r(2)), 100);
        assert_eq!(l.joined_amount_at(&test_address(1), r(3)), 100);
        assert_eq!(l.joined_amount_at(&test_address(1), r(4)), 250);
        assert_eq!(l.group_total_at(test_group(1), r(3)), 100);
    }

    #[test]
    fn revert_join_restores_prior_state() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();
        l.revert_join(&test_address(1), 100, r(1));

        assert!(l.join_info(&test_address(1)).is_none());
        assert_eq!(l.member_count(test_group(1)), 0);
        assert_eq!(l.group(test_group(1)).unwrap().total_joined, 0);
        assert_eq!(l.group(test_group(1)).unwrap().all_time_joined, 0);
        assert!(l.check_consistency());
    }

    #[test]
    fn revert_exit_restores_membership() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();
        let (group, refund) = l.exit(&test_address(1), r(2)).unwrap();
        l.revert_exit(&test_address(1), group, refund, r(2));

        assert_eq!(l.join_info(&test_address(1)).unwrap().amount, 100);
        assert_eq!(l.member_count(test_group(1)), 1);
        assert_eq!(l.group(test_group(1)).unwrap().total_joined, 100);
        assert!(l.check_consistency());
    }

    #[test]
    fn inconsistent_limits_rejected() {
        let mut l = ledger_with_group(1000);
        let err = l
            .set_join_limits(test_group(1), Some(100), Some(50))
            .unwrap_err();
        assert!(matches!(err, JoinError::InconsistentJoinLimits { min: 100, max: 50 }));
    }

    #[test]
    fn member_cap_cannot_undercut_roster() {
        let mut l = ledger_with_group(10_000);
        l.join(&test_address(1), test_group(1), 100, CAP, r(1)).unwrap();
        l.join(&test_address(2), test_group(1), 100, CAP, r(1)).unwrap();
        let err = l.set_max_members(test_group(1), Some(1)).unwrap_err();
        assert!(matches!(err, JoinError::MemberCapBelowCount { cap: 1, count: 2 }));
    }
}
