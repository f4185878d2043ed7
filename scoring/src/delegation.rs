//! Verifier delegation — an owner entrusts scoring to another account.
//!
//! A delegation records the owner that granted it. It is honored only while
//! the ownership registry still reports that same owner for the group, so a
//! group transfer silently voids the previous owner's delegation without
//! the registry needing a transfer hook.

use cohort_types::{Address, GroupId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One group's delegation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// The account allowed to submit score batches.
    pub delegate: Address,
    /// The owner at delegation time. Checked against current ownership on
    /// every use.
    pub granted_by: Address,
}

/// Per-group delegation table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelegationTable {
    delegations: HashMap<GroupId, Delegation>,
}

impl DelegationTable {
    /// Record (or replace) a delegation granted by `owner`.
    pub fn set(&mut self, group: GroupId, owner: Address, delegate: Address) {
        self.delegations.insert(
            group,
            Delegation {
                delegate,
                granted_by: owner,
            },
        );
    }

    /// Remove a group's delegation. Returns whether one existed.
    pub fn clear(&mut self, group: GroupId) -> bool {
        self.delegations.remove(&group).is_some()
    }

    pub fn get(&self, group: GroupId) -> Option<&Delegation> {
        self.delegations.get(&group)
    }

    /// Whether `caller` may verify `group` whose current owner is
    /// `current_owner`: either the owner directly, or a delegate whose
    /// grant is still backed by the same owner.
    pub fn is_authorized(&self, group: GroupId, caller: &Address, current_owner: &Address) -> bool {
        if caller == current_owner {
            return true;
        }
        self.delegations
            .get(&group)
            .is_some_and(|d| &d.delegate == caller && &d.granted_by == current_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn owner_is_always_authorized() {
        let table = DelegationTable::default();
        assert!(table.is_authorized(GroupId::new(1), &addr("owner"), &addr("owner")));
        assert!(!table.is_authorized(GroupId::new(1), &addr("someone"), &addr("owner")));
    }

    #[test]
    fn delegate_authorized_while_owner_unchanged() {
        let mut table = DelegationTable::default();
        table.set(GroupId::new(1), addr("owner"), addr("delegate"));
        assert!(table.is_authorized(GroupId::new(1), &addr("delegate"), &addr("owner")));
        // Delegations are per-group.
        assert!(!table.is_authorized(GroupId::new(2), &addr("delegate"), &addr("owner")));
    }

    #[test]
    fn ownership_transfer_voids_delegation() {
        let mut table = DelegationTable::default();
        table.set(GroupId::new(1), addr("owner"), addr("delegate"));
        // The registry now reports a new owner: the stale grant is dead,
        // but the new owner verifies directly.
        assert!(!table.is_authorized(GroupId::new(1), &addr("delegate"), &addr("new_owner")));
        assert!(table.is_authorized(GroupId::new(1), &addr("new_owner"), &addr("new_owner")));
    }

    #[test]
    fn clear_removes_grant() {
        let mut table = DelegationTable::default();
        table.set(GroupId::new(1), addr("owner"), addr("delegate"));
        assert!(table.clear(GroupId::new(1)));
        assert!(!table.clear(GroupId::new(1)));
        assert!(!table.is_authorized(GroupId::new(1), &addr("delegate"), &addr("owner")));
    }
}
