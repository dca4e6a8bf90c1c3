//! Persisted engine state.
//!
//! The engine is in-memory; [`GovernanceSnapshot`] is the detached copy that
//! is written to and read back from a [`GovernanceStore`]. Values are bincode.
//!
//! A save first clears the schema version to an empty marker and writes the
//! real version last, so a save that stops halfway is refused by `load`.

use crate::error::GovernanceError;
use crate::phase::DaoPhase;
use crate::proposal::Proposal;
use crate::registry::ProposalStatistic;
use crate::tally::VotingResult;
use crate::voting::VoteRecord;
use civitas_store::{meta_keys, GovernanceStore, StoreError};
use civitas_types::{Address, Amount, ProposalId};
use serde::de::DeserializeOwned;

const SCHEMA_VERSION: u32 = 1;

/// Ballots of one proposal, voters in first-vote order.
pub type Ballots = Vec<(Address, VoteRecord)>;

#[derive(Clone, Debug, PartialEq)]
pub struct GovernanceSnapshot {
    pub phase: DaoPhase,
    pub tracked: Vec<ProposalId>,
    pub statistic: ProposalStatistic,
    pub create_proposal_fee: Amount,
    pub proposals: Vec<(ProposalId, Proposal)>,
    pub ballots: Vec<(ProposalId, Ballots)>,
    pub results: Vec<(ProposalId, VotingResult)>,
}

impl GovernanceSnapshot {
    pub fn save(&self, store: &dyn GovernanceStore) -> Result<(), GovernanceError> {
        store.put_meta(meta_keys::SCHEMA_VERSION, &[])?;
        store.put_meta(meta_keys::PHASE, &bincode::serialize(&self.phase)?)?;
        store.put_meta(meta_keys::TRACKED_PROPOSALS, &bincode::serialize(&self.tracked)?)?;
        store.put_meta(meta_keys::STATISTIC, &bincode::serialize(&self.statistic)?)?;
        store.put_meta(
            meta_keys::CREATE_PROPOSAL_FEE,
            &bincode::serialize(&self.create_proposal_fee)?,
        )?;

        for (id, proposal) in &self.proposals {
            store.put_proposal(id, &bincode::serialize(proposal)?)?;
        }
        for (id, ballots) in &self.ballots {
            let voters: Vec<Address> = ballots.iter().map(|(voter, _)| *voter).collect();
            store.put_voters(id, &bincode::serialize(&voters)?)?;
            for (voter, record) in ballots {
                store.put_vote(id, voter, &bincode::serialize(record)?)?;
            }
        }
        for (id, result) in &self.results {
            store.put_result(id, &bincode::serialize(result)?)?;
        }
        store.put_meta(meta_keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_be_bytes())?;
        Ok(())
    }

    /// Read back a snapshot. Fails with `StoreError::NotFound` on an empty
    /// store.
    pub fn load(store: &dyn GovernanceStore) -> Result<Self, GovernanceError> {
        match store.get_meta(meta_keys::SCHEMA_VERSION)? {
            Some(bytes) if bytes.as_slice() == SCHEMA_VERSION.to_be_bytes() => {}
            Some(bytes) if bytes.is_empty() => {
                return Err(StoreError::Corruption("incomplete snapshot".into()).into())
            }
            Some(bytes) => {
                return Err(StoreError::Corruption(format!(
                    "unsupported schema version {}",
                    describe_version(&bytes)
                ))
                .into())
            }
            None => return Err(StoreError::NotFound("governance state".into()).into()),
        }

        let phase = required_meta(store, meta_keys::PHASE)?;
        let tracked = required_meta(store, meta_keys::TRACKED_PROPOSALS)?;
        let statistic = required_meta(store, meta_keys::STATISTIC)?;
        let create_proposal_fee = required_meta(store, meta_keys::CREATE_PROPOSAL_FEE)?;

        let mut proposals = Vec::new();
        let mut ballots = Vec::new();
        let mut results = Vec::new();
        for (id, bytes) in store.iter_proposals()? {
            proposals.push((id, bincode::deserialize::<Proposal>(&bytes)?));

            if let Some(bytes) = store.get_voters(&id)? {
                let voters: Vec<Address> = bincode::deserialize(&bytes)?;
                let mut entries = Vec::with_capacity(voters.len());
                for voter in voters {
                    let bytes = store.get_vote(&id, &voter)?.ok_or_else(|| {
                        StoreError::Corruption(format!("missing vote of {voter} on {id}"))
                    })?;
                    entries.push((voter, bincode::deserialize(&bytes)?));
                }
                ballots.push((id, entries));
            }

            if let Some(bytes) = store.get_result(&id)? {
                results.push((id, bincode::deserialize(&bytes)?));
            }
        }

        Ok(Self {
            phase,
            tracked,
            statistic,
            create_proposal_fee,
            proposals,
            ballots,
            results,
        })
    }
}

fn required_meta<T: DeserializeOwned>(
    store: &dyn GovernanceStore,
    key: &[u8],
) -> Result<T, GovernanceError> {
    let bytes = store.get_meta(key)?.ok_or_else(|| {
        StoreError::Corruption(format!("missing meta record {}", String::from_utf8_lossy(key)))
    })?;
    Ok(bincode::deserialize(&bytes)?)
}

fn describe_version(bytes: &[u8]) -> String {
    match <[u8; 4]>::try_from(bytes) {
        Ok(raw) => u32::from_be_bytes(raw).to_string(),
        Err(_) => format!("<{} bytes>", bytes.len()),
    }
}
