//! LMDB storage backend for civitas.
//!
//! Implements [`GovernanceStore`](civitas_store::GovernanceStore) using the
//! `heed` LMDB bindings. Each logical table maps to one LMDB database within a
//! single environment.

pub mod environment;
pub mod error;
pub mod governance;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
