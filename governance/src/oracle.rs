//! Read-only collaborator interfaces: validator registry and staking ledger.
//!
//! The engine never computes eligibility or stake itself; it only asks.

use civitas_types::{Address, Amount, Timestamp};

/// Validator registry queries.
pub trait ValidatorOracle: Send + Sync {
    /// Map a staking identity to the mining identity it controls, if any.
    fn mining_identity_of(&self, staker: &Address) -> Option<Address>;

    /// When the mining identity became an active validator. `None` (or a zero
    /// timestamp) means it is not an active validator.
    fn active_validator_since(&self, miner: &Address) -> Option<Timestamp>;
}

/// Staking ledger queries.
pub trait StakingOracle: Send + Sync {
    /// Current total stake of an account.
    fn total_stake_of(&self, account: &Address) -> Amount;
}

/// Whether `account` may vote: it must map to a mining identity that has been
/// an active validator since a non-zero time.
pub fn is_active_validator(oracle: &dyn ValidatorOracle, account: &Address) -> bool {
    oracle
        .mining_identity_of(account)
        .filter(|miner| !miner.is_zero())
        .and_then(|miner| oracle.active_validator_since(&miner))
        .is_some_and(|since| !since.is_zero())
}
