//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the governance engine talks to (validator registry,
//! staking ledger, treasury, call host, storage) has an in-memory stand-in
//! here that:
//! - returns deterministic values
//! - can be configured and inspected programmatically
//! - never touches the filesystem or network
//!
//! Usage: build a [`NullEnvironment`] and hand its
//! [`collaborators`](NullEnvironment::collaborators) to the engine.

pub mod clock;
pub mod host;
pub mod oracle;
pub mod store;
pub mod treasury;

pub use clock::NullClock;
pub use host::{NullCallHost, RecordedCall};
pub use oracle::{NullStakingOracle, NullValidatorOracle};
pub use store::NullGovernanceStore;
pub use treasury::{NullTreasury, Transfer};

use civitas_governance::Collaborators;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// All nullable collaborators, shared so tests can inspect them after the
/// engine has used them.
#[derive(Clone, Default)]
pub struct NullEnvironment {
    pub validators: Arc<NullValidatorOracle>,
    pub staking: Arc<NullStakingOracle>,
    pub treasury: Arc<NullTreasury>,
    pub host: Arc<NullCallHost>,
}

impl NullEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            validators: self.validators.clone(),
            staking: self.staking.clone(),
            treasury: self.treasury.clone(),
            host: self.host.clone(),
        }
    }
}

/// Lock, recovering the data from a poisoned mutex.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
