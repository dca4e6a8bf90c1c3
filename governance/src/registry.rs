//! Proposal registry: the table of proposals and the running statistic.

use crate::error::GovernanceError;
use crate::proposal::{Proposal, ProposalState};
use civitas_types::ProposalId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Diagnostic counters. Only ever incremented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStatistic {
    pub total: u64,
    pub canceled: u64,
    pub accepted: u64,
    pub declined: u64,
}

/// Owns every proposal record. Records are never removed.
#[derive(Debug, Default)]
pub struct ProposalRegistry {
    proposals: HashMap<ProposalId, Proposal>,
    statistic: ProposalStatistic,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn restore(
        proposals: impl IntoIterator<Item = (ProposalId, Proposal)>,
        statistic: ProposalStatistic,
    ) -> Self {
        Self {
            proposals: proposals.into_iter().collect(),
            statistic,
        }
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn exists(&self, id: &ProposalId) -> bool {
        self.proposals.contains_key(id)
    }

    /// Look up a proposal or fail with `NotExist`.
    pub fn require(&self, id: &ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(id)
            .ok_or(GovernanceError::NotExist(*id))
    }

    /// State of a proposal, `ProposalState::None` when absent.
    pub fn state_of(&self, id: &ProposalId) -> ProposalState {
        self.proposals
            .get(id)
            .map(|p| p.state)
            .unwrap_or(ProposalState::None)
    }

    pub fn statistic(&self) -> ProposalStatistic {
        self.statistic
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProposalId, &Proposal)> {
        self.proposals.iter()
    }

    /// Insert a freshly created proposal and count it.
    pub(crate) fn insert(&mut self, id: ProposalId, proposal: Proposal) -> Result<(), GovernanceError> {
        if self.proposals.contains_key(&id) {
            return Err(GovernanceError::AlreadyExists(id));
        }
        self.proposals.insert(id, proposal);
        self.statistic.total = self.statistic.total.saturating_add(1);
        Ok(())
    }

    /// Move a proposal from `from` to `to`. Returns `false` (and leaves the
    /// record alone) when the proposal is missing or not in `from`.
    pub(crate) fn transition(&mut self, id: &ProposalId, from: ProposalState, to: ProposalState) -> bool {
        match self.proposals.get_mut(id) {
            Some(proposal) if proposal.state == from => {
                proposal.state = to;
                true
            }
            _ => false,
        }
    }

    /// Overwrite a state unconditionally; used to undo a transition.
    pub(crate) fn set_state(&mut self, id: &ProposalId, state: ProposalState) {
        if let Some(proposal) = self.proposals.get_mut(id) {
            proposal.state = state;
        }
    }

    pub(crate) fn record_canceled(&mut self) {
        self.statistic.canceled = self.statistic.canceled.saturating_add(1);
    }

    pub(crate) fn record_outcome(&mut self, accepted: bool) {
        if accepted {
            self.statistic.accepted = self.statistic.accepted.saturating_add(1);
        } else {
            self.statistic.declined = self.statistic.declined.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::Payload;
    use civitas_types::{Address, Amount};

    fn proposal() -> Proposal {
        Proposal {
            proposer: Address::from_low_u64(1),
            state: ProposalState::Created,
            targets: vec![Address::from_low_u64(2)],
            values: vec![Amount::ZERO],
            payloads: vec![Payload::Call(vec![])],
            description: "test".into(),
        }
    }

    #[test]
    fn missing_proposal_has_none_state() {
        let registry = ProposalRegistry::new();
        let id = ProposalId::new([1; 32]);
        assert_eq!(registry.state_of(&id), ProposalState::None);
        assert!(matches!(
            registry.require(&id),
            Err(GovernanceError::NotExist(_))
        ));
    }

    #[test]
    fn insert_counts_and_rejects_duplicates() {
        let mut registry = ProposalRegistry::new();
        let id = ProposalId::new([1; 32]);
        registry.insert(id, proposal()).unwrap();
        assert_eq!(registry.statistic().total, 1);
        assert!(matches!(
            registry.insert(id, proposal()),
            Err(GovernanceError::AlreadyExists(_))
        ));
        assert_eq!(registry.statistic().total, 1);
    }

    #[test]
    fn transition_requires_source_state() {
        let mut registry = ProposalRegistry::new();
        let id = ProposalId::new([1; 32]);
        registry.insert(id, proposal()).unwrap();
        assert!(!registry.transition(&id, ProposalState::Active, ProposalState::VotingFinished));
        assert!(registry.transition(&id, ProposalState::Created, ProposalState::Active));
        assert_eq!(registry.state_of(&id), ProposalState::Active);
    }

    #[test]
    fn outcomes_are_counted_separately() {
        let mut registry = ProposalRegistry::new();
        registry.record_outcome(true);
        registry.record_outcome(false);
        registry.record_outcome(false);
        registry.record_canceled();
        let stat = registry.statistic();
        assert_eq!((stat.accepted, stat.declined, stat.canceled), (1, 2, 1));
    }
}
