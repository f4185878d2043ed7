//! Nullable ownership registry — programmable group identities for testing.

use cohort_externals::OwnershipRegistry;
use cohort_types::{Address, GroupId};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory ownership registry.
///
/// Groups are assigned (and reassigned, to simulate identity transfers)
/// programmatically; enumeration order is insertion order per owner.
pub struct NullOwnershipRegistry {
    owners: Mutex<HashMap<GroupId, Address>>,
    by_owner: Mutex<HashMap<Address, Vec<GroupId>>>,
}

impl NullOwnershipRegistry {
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
            by_owner: Mutex::new(HashMap::new()),
        }
    }

    /// Assign `group` to `owner`, removing it from any previous owner.
    pub fn assign(&self, group: GroupId, owner: Address) {
        let mut owners = self.owners.lock().unwrap();
        let mut by_owner = self.by_owner.lock().unwrap();
        if let Some(previous) = owners.insert(group, owner.clone()) {
            if let Some(list) = by_owner.get_mut(&previous) {
                list.retain(|g| *g != group);
            }
        }
        by_owner.entry(owner).or_default().push(group);
    }
}

impl Default for NullOwnershipRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipRegistry for NullOwnershipRegistry {
    fn owner_of(&self, group: GroupId) -> Option<Address> {
        self.owners.lock().unwrap().get(&group).cloned()
    }

    fn group_count(&self, owner: &Address) -> usize {
        self.by_owner
            .lock()
            .unwrap()
            .get(owner)
            .map_or(0, Vec::len)
    }

    fn group_at_index(&self, owner: &Address, index: usize) -> Option<GroupId> {
        self.by_owner
            .lock()
            .unwrap()
            .get(owner)
            .and_then(|list| list.get(index).copied())
    }
}
