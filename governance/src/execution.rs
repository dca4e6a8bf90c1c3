//! Execution seams: the call host for external targets and the privileged
//! capability for self-configuration.

use civitas_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("insufficient value: need {needed}, have {available}")]
    InsufficientValue { needed: Amount, available: Amount },
}

/// The environment that performs value-carrying calls to arbitrary targets.
///
/// Calls made between [`begin`](Self::begin) and [`commit`](Self::commit)
/// only take effect at commit; [`rollback`](Self::rollback) discards them.
pub trait CallHost: Send + Sync {
    fn begin(&self);

    fn call(&self, target: &Address, value: Amount, payload: &[u8]) -> Result<(), CallError>;

    fn commit(&self);

    fn rollback(&self);
}

/// Proof that the caller is the engine's own execution path.
///
/// It cannot be built outside this crate, so privileged setters that demand
/// it are only reachable from proposal execution.
#[derive(Debug)]
pub struct Privileged {
    _seal: (),
}

impl Privileged {
    pub(crate) fn issue() -> Self {
        Self { _seal: () }
    }
}
