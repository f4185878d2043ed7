//! Nullable reward minter — programmed pool amounts with a call counter.

use cohort_externals::RewardMinter;
use cohort_types::Round;
use std::collections::HashMap;
use std::sync::Mutex;

/// A reward minter answering programmed per-round pools.
///
/// Unprogrammed rounds mint 0. The call counter lets tests prove the engine
/// memoizes pools instead of re-minting.
pub struct NullRewardMinter {
    pools: Mutex<HashMap<Round, u128>>,
    calls: Mutex<u64>,
}

impl NullRewardMinter {
    pub fn new() -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
            calls: Mutex::new(0),
        }
    }

    /// Program the pool minted for `round`.
    pub fn set_pool(&self, round: Round, amount: u128) {
        self.pools.lock().unwrap().insert(round, amount);
    }

    /// How many times the engine asked for a pool.
    pub fn mint_calls(&self) -> u64 {
        *self.calls.lock().unwrap()
    }
}

impl Default for NullRewardMinter {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardMinter for NullRewardMinter {
    fn mint_reward_for_round(&self, round: Round) -> u128 {
        *self.calls.lock().unwrap() += 1;
        self.pools.lock().unwrap().get(&round).copied().unwrap_or(0)
    }
}
