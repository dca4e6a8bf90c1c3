//! Cryptographic primitives for civitas.
//!
//! Proposal identifiers are Blake2b-256 digests over a canonical encoding of the
//! proposal content; this crate owns the digest, the governance crate owns the
//! encoding.

pub mod hash;

pub use hash::{blake2b_256, hash_to_proposal_id};
