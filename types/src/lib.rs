//! Fundamental types for the civitas governance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, proposal identifiers, amounts and timestamps.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use error::TypeError;
pub use hash::ProposalId;
pub use time::Timestamp;
