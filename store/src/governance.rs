//! Governance storage trait.

use crate::StoreError;
use civitas_types::{Address, ProposalId};

/// Well-known keys for the singleton records kept in the meta table.
pub mod meta_keys {
    pub const PHASE: &[u8] = b"phase";
    pub const STATISTIC: &[u8] = b"statistic";
    pub const CREATE_PROPOSAL_FEE: &[u8] = b"create_proposal_fee";
    pub const TRACKED_PROPOSALS: &[u8] = b"tracked_proposals";
    pub const SCHEMA_VERSION: &[u8] = b"schema_version";
}

/// Trait for storing governance state.
///
/// Layout: one record per proposal, one vote record per (proposal, voter),
/// one voter set and one tally result per proposal, plus singleton meta
/// records. Values are opaque bytes; the governance crate owns the encoding.
pub trait GovernanceStore {
    fn put_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError>;

    fn get_proposal(&self, id: &ProposalId) -> Result<Option<Vec<u8>>, StoreError>;

    /// All stored proposals, in no particular order.
    fn iter_proposals(&self) -> Result<Vec<(ProposalId, Vec<u8>)>, StoreError>;

    fn put_vote(
        &self,
        proposal: &ProposalId,
        voter: &Address,
        data: &[u8],
    ) -> Result<(), StoreError>;

    fn get_vote(&self, proposal: &ProposalId, voter: &Address)
        -> Result<Option<Vec<u8>>, StoreError>;

    /// All vote records for a proposal.
    fn get_votes(&self, proposal: &ProposalId) -> Result<Vec<(Address, Vec<u8>)>, StoreError>;

    /// Store the insertion-ordered voter set of a proposal.
    fn put_voters(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError>;

    fn get_voters(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError>;

    fn put_result(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError>;

    fn get_result(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError>;

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
}
