//! Blake2b hashing for proposal content.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use civitas_types::ProposalId;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash an already canonically encoded proposal into its identifier.
pub fn hash_to_proposal_id(encoded: &[u8]) -> ProposalId {
    ProposalId::new(blake2b_256(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        let h1 = blake2b_256(b"raise the fee");
        let h2 = blake2b_256(b"raise the fee");
        assert_eq!(h1, h2);
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"yes"), blake2b_256(b"no"));
    }

    #[test]
    fn blake2b_empty() {
        assert_ne!(blake2b_256(b""), [0u8; 32]);
    }

    #[test]
    fn proposal_id_is_non_zero() {
        assert!(!hash_to_proposal_id(b"proposal").is_zero());
    }
}
