//! Fee forwarding to the configured sink account.

use civitas_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreasuryError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Trusted value transfer. Must either move the full amount or fail.
pub trait Treasury: Send + Sync {
    fn forward(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TreasuryError>;
}
