//! Nullable validator registry and staking ledger.

use crate::lock;
use civitas_governance::{StakingOracle, ValidatorOracle};
use civitas_types::{Address, Amount, Timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct NullValidatorOracle {
    identities: Mutex<HashMap<Address, Address>>,
    active_since: Mutex<HashMap<Address, Timestamp>>,
}

impl NullValidatorOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `staker` as controlling `miner`, active since `since`.
    pub fn add_validator(&self, staker: Address, miner: Address, since: Timestamp) {
        lock(&self.identities).insert(staker, miner);
        lock(&self.active_since).insert(miner, since);
    }

    /// Map a staker to a mining identity without activating it.
    pub fn map_identity(&self, staker: Address, miner: Address) {
        lock(&self.identities).insert(staker, miner);
    }

    pub fn deactivate(&self, miner: &Address) {
        lock(&self.active_since).remove(miner);
    }
}

impl ValidatorOracle for NullValidatorOracle {
    fn mining_identity_of(&self, staker: &Address) -> Option<Address> {
        lock(&self.identities).get(staker).copied()
    }

    fn active_validator_since(&self, miner: &Address) -> Option<Timestamp> {
        lock(&self.active_since).get(miner).copied()
    }
}

/// Unknown accounts have zero stake.
#[derive(Debug, Default)]
pub struct NullStakingOracle {
    stakes: Mutex<HashMap<Address, Amount>>,
}

impl NullStakingOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stake(&self, account: Address, stake: Amount) {
        lock(&self.stakes).insert(account, stake);
    }
}

impl StakingOracle for NullStakingOracle {
    fn total_stake_of(&self, account: &Address) -> Amount {
        lock(&self.stakes).get(account).copied().unwrap_or_default()
    }
}
