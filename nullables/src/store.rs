//! Nullable store: thread-safe in-memory governance storage.

use crate::lock;
use civitas_store::{GovernanceStore, StoreError};
use civitas_types::{Address, ProposalId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct NullGovernanceStore {
    proposals: Mutex<BTreeMap<ProposalId, Vec<u8>>>,
    votes: Mutex<BTreeMap<(ProposalId, Address), Vec<u8>>>,
    voters: Mutex<HashMap<ProposalId, Vec<u8>>>,
    results: Mutex<HashMap<ProposalId, Vec<u8>>>,
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposal_count(&self) -> usize {
        lock(&self.proposals).len()
    }
}

impl GovernanceStore for NullGovernanceStore {
    fn put_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        lock(&self.proposals).insert(*id, data.to_vec());
        Ok(())
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.proposals).get(id).cloned())
    }

    fn iter_proposals(&self) -> Result<Vec<(ProposalId, Vec<u8>)>, StoreError> {
        Ok(lock(&self.proposals)
            .iter()
            .map(|(id, data)| (*id, data.clone()))
            .collect())
    }

    fn put_vote(&self, proposal: &ProposalId, voter: &Address, data: &[u8]) -> Result<(), StoreError> {
        lock(&self.votes).insert((*proposal, *voter), data.to_vec());
        Ok(())
    }

    fn get_vote(&self, proposal: &ProposalId, voter: &Address) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.votes).get(&(*proposal, *voter)).cloned())
    }

    fn get_votes(&self, proposal: &ProposalId) -> Result<Vec<(Address, Vec<u8>)>, StoreError> {
        Ok(lock(&self.votes)
            .iter()
            .filter(|((id, _), _)| id == proposal)
            .map(|((_, voter), data)| (*voter, data.clone()))
            .collect())
    }

    fn put_voters(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        lock(&self.voters).insert(*proposal, data.to_vec());
        Ok(())
    }

    fn get_voters(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.voters).get(proposal).cloned())
    }

    fn put_result(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        lock(&self.results).insert(*proposal, data.to_vec());
        Ok(())
    }

    fn get_result(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.results).get(proposal).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        lock(&self.meta).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.meta).get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_are_scoped_to_their_proposal() {
        let store = NullGovernanceStore::new();
        let a = ProposalId::new([1; 32]);
        let b = ProposalId::new([2; 32]);
        store.put_vote(&a, &Address::from_low_u64(1), b"x").unwrap();
        store.put_vote(&b, &Address::from_low_u64(2), b"y").unwrap();
        let votes = store.get_votes(&a).unwrap();
        assert_eq!(votes, vec![(Address::from_low_u64(1), b"x".to_vec())]);
        assert_eq!(store.get_vote(&b, &Address::from_low_u64(1)).unwrap(), None);
    }
}
