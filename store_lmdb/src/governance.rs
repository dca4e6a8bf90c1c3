//! LMDB implementation of GovernanceStore.
//!
//! Five databases:
//! - `proposals`: `proposal_id(32)` → proposal record.
//! - `votes`: `proposal_id(32) ++ voter(20)` → vote record. The shared prefix
//!   makes all votes of a proposal one range scan.
//! - `voters`: `proposal_id(32)` → insertion-ordered voter set.
//! - `results`: `proposal_id(32)` → tally result.
//! - `meta`: singleton records keyed by name.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use civitas_store::{GovernanceStore, StoreError};
use civitas_types::{Address, ProposalId};

use crate::LmdbError;

const VOTE_KEY_LEN: usize = 32 + Address::LEN;

pub struct LmdbGovernanceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) voters_db: Database<Bytes, Bytes>,
    pub(crate) results_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn vote_key(proposal: &ProposalId, voter: &Address) -> [u8; VOTE_KEY_LEN] {
    let mut key = [0u8; VOTE_KEY_LEN];
    key[..32].copy_from_slice(proposal.as_bytes());
    key[32..].copy_from_slice(voter.as_bytes());
    key
}

impl LmdbGovernanceStore {
    fn put(&self, db: Database<Bytes, Bytes>, key: &[u8], value: &[u8]) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get(&self, db: Database<Bytes, Bytes>, key: &[u8]) -> Result<Option<Vec<u8>>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(db.get(&rtxn, key)?.map(<[u8]>::to_vec))
    }
}

impl GovernanceStore for LmdbGovernanceStore {
    fn put_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(self.proposals_db, id.as_bytes(), data)?)
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.proposals_db, id.as_bytes())?)
    }

    fn iter_proposals(&self) -> Result<Vec<(ProposalId, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut proposals = Vec::new();
        for entry in self.proposals_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let id: [u8; 32] = key.try_into().map_err(|_| LmdbError::MalformedKey {
                table: "proposals",
                len: key.len(),
            })?;
            proposals.push((ProposalId::new(id), value.to_vec()));
        }
        Ok(proposals)
    }

    fn put_vote(&self, proposal: &ProposalId, voter: &Address, data: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(self.votes_db, &vote_key(proposal, voter), data)?)
    }

    fn get_vote(&self, proposal: &ProposalId, voter: &Address) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.votes_db, &vote_key(proposal, voter))?)
    }

    fn get_votes(&self, proposal: &ProposalId) -> Result<Vec<(Address, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .votes_db
            .prefix_iter(&rtxn, proposal.as_bytes().as_slice())
            .map_err(LmdbError::from)?;
        let mut votes = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(LmdbError::from)?;
            if key.len() != VOTE_KEY_LEN {
                return Err(LmdbError::MalformedKey {
                    table: "votes",
                    len: key.len(),
                }
                .into());
            }
            let voter = Address::from_slice(&key[32..]).map_err(|_| LmdbError::MalformedKey {
                table: "votes",
                len: key.len(),
            })?;
            votes.push((voter, value.to_vec()));
        }
        Ok(votes)
    }

    fn put_voters(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(self.voters_db, proposal.as_bytes(), data)?)
    }

    fn get_voters(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.voters_db, proposal.as_bytes())?)
    }

    fn put_result(&self, proposal: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(self.results_db, proposal.as_bytes(), data)?)
    }

    fn get_result(&self, proposal: &ProposalId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.results_db, proposal.as_bytes())?)
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(self.meta_db, key, value)?)
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.meta_db, key)?)
    }
}
