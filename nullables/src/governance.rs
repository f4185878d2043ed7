//! Nullable governance ledger — programmable vote weights for testing.

use cohort_externals::GovernanceLedger;
use cohort_types::Address;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory governance ledger with directly settable vote weights.
pub struct NullGovernanceLedger {
    votes: Mutex<HashMap<Address, u128>>,
    total: Mutex<u128>,
}

impl NullGovernanceLedger {
    pub fn new() -> Self {
        Self {
            votes: Mutex::new(HashMap::new()),
            total: Mutex::new(0),
        }
    }

    /// Set `account`'s vote weight, adjusting the total accordingly.
    pub fn set_votes(&self, account: Address, amount: u128) {
        let mut votes = self.votes.lock().unwrap();
        let mut total = self.total.lock().unwrap();
        let previous = votes.insert(account, amount).unwrap_or(0);
        *total = *total - previous + amount;
    }

    /// Override the outstanding total independently of per-account weights.
    pub fn set_total_votes(&self, amount: u128) {
        *self.total.lock().unwrap() = amount;
    }
}

impl Default for NullGovernanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceLedger for NullGovernanceLedger {
    fn valid_votes(&self, account: &Address) -> u128 {
        self.votes.lock().unwrap().get(account).copied().unwrap_or(0)
    }

    fn total_votes(&self) -> u128 {
        *self.total.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_votes_tracks_total() {
        let gov = NullGovernanceLedger::new();
        let alice = Address::new("acct_01");
        gov.set_votes(alice.clone(), 100);
        gov.set_votes(Address::new("acct_02"), 50);
        assert_eq!(gov.valid_votes(&alice), 100);
        assert_eq!(gov.total_votes(), 150);

        gov.set_votes(alice.clone(), 30);
        assert_eq!(gov.total_votes(), 80);
    }
}
