//! Nullable asset ledger — in-memory balances with a transfer journal.

use cohort_externals::{AssetError, AssetLedger};
use cohort_types::Address;
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded transfer, in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferEntry {
    /// `None` for engine-outgoing transfers.
    pub from: Option<Address>,
    pub to: Address,
    pub amount: u128,
}

/// An in-memory asset ledger.
///
/// Engine-outgoing `transfer` calls always succeed (the engine pays out of
/// holdings it accumulated via `transfer_from`); pull transfers check the
/// payer's balance. Every successful transfer lands in the journal so tests
/// can assert on exactly what moved.
pub struct NullAssetLedger {
    balances: Mutex<HashMap<Address, u128>>,
    journal: Mutex<Vec<TransferEntry>>,
    total_supply: u128,
    /// Addresses whose transfers fail with `Rejected`, for abort-path tests.
    rejected: Mutex<Vec<Address>>,
}

impl NullAssetLedger {
    pub fn new(total_supply: u128) -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            total_supply,
            rejected: Mutex::new(Vec::new()),
        }
    }

    /// Credit `account` with `amount`.
    pub fn fund(&self, account: &Address, amount: u128) {
        *self.balances.lock().unwrap().entry(account.clone()).or_default() += amount;
    }

    /// Make every transfer touching `account` fail with `Rejected`.
    pub fn reject_transfers_for(&self, account: Address) {
        self.rejected.lock().unwrap().push(account);
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// All successful transfers so far, oldest first.
    pub fn transfers(&self) -> Vec<TransferEntry> {
        self.journal.lock().unwrap().clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.journal.lock().unwrap().len()
    }

    fn is_rejected(&self, account: &Address) -> bool {
        self.rejected.lock().unwrap().contains(account)
    }
}

impl AssetLedger for NullAssetLedger {
    fn transfer(&self, to: &Address, amount: u128) -> Result<(), AssetError> {
        if self.is_rejected(to) {
            return Err(AssetError::Rejected(format!("recipient {to} rejected")));
        }
        *self.balances.lock().unwrap().entry(to.clone()).or_default() += amount;
        self.journal.lock().unwrap().push(TransferEntry {
            from: None,
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<(), AssetError> {
        if self.is_rejected(from) || self.is_rejected(to) {
            return Err(AssetError::Rejected(format!("transfer {from} -> {to} rejected")));
        }
        let mut balances = self.balances.lock().unwrap();
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        balances.insert(from.clone(), available - amount);
        *balances.entry(to.clone()).or_default() += amount;
        drop(balances);
        self.journal.lock().unwrap().push(TransferEntry {
            from: Some(from.clone()),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}
