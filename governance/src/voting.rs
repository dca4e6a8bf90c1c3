//! Vote records and per-proposal voter sets.
//!
//! One record per (proposal, voter). Voting again replaces the record; the
//! voter set only grows and never holds duplicates, so repeat votes cannot be
//! double counted at tally time.

use civitas_types::{Address, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
        })
    }
}

/// The latest vote of one voter on one proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub timestamp: Timestamp,
    pub choice: VoteChoice,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct VoteBook {
    /// Distinct voters per proposal, in order of their first vote.
    voters: HashMap<ProposalId, Vec<Address>>,
    records: HashMap<(ProposalId, Address), VoteRecord>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote, replacing any earlier vote by the same voter.
    ///
    /// Returns `true` if this is the voter's first vote on the proposal.
    pub fn cast(&mut self, proposal: ProposalId, voter: Address, record: VoteRecord) -> bool {
        let first = self.records.insert((proposal, voter), record).is_none();
        if first {
            self.voters.entry(proposal).or_default().push(voter);
        }
        first
    }

    pub fn voters(&self, proposal: &ProposalId) -> &[Address] {
        self.voters.get(proposal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn voter_count(&self, proposal: &ProposalId) -> usize {
        self.voters(proposal).len()
    }

    pub fn record(&self, proposal: &ProposalId, voter: &Address) -> Option<&VoteRecord> {
        self.records.get(&(*proposal, *voter))
    }

    /// Every (voter, record) pair of a proposal in voter-set order.
    pub fn ballots<'a>(
        &'a self,
        proposal: &'a ProposalId,
    ) -> impl Iterator<Item = (&'a Address, &'a VoteRecord)> + 'a {
        self.voters(proposal).iter().filter_map(move |voter| {
            self.records
                .get(&(*proposal, *voter))
                .map(|record| (voter, record))
        })
    }

    /// Proposals that have at least one vote.
    pub fn proposals(&self) -> impl Iterator<Item = &ProposalId> {
        self.voters.keys()
    }

    pub(crate) fn restore(
        ballots: impl IntoIterator<Item = (ProposalId, Vec<(Address, VoteRecord)>)>,
    ) -> Self {
        let mut book = Self::new();
        for (proposal, entries) in ballots {
            for (voter, record) in entries {
                book.cast(proposal, voter, record);
            }
        }
        book
    }
}
