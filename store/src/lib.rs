//! Abstract storage traits for civitas.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The governance engine depends only on the traits and serializes its
//! own records, so this crate never depends on `civitas-governance`.

pub mod error;
pub mod governance;

pub use error::StoreError;
pub use governance::{meta_keys, GovernanceStore};
