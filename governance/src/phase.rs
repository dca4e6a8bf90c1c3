//! Phase scheduler: the alternating Proposal/Voting clock.
//!
//! Windows have a fixed duration and follow each other back to back
//! (`next.start = previous.end + 1`). Nothing moves on its own: a rollover only
//! happens when [`PhaseScheduler::advance`] is called at or after the current
//! window's end, and then exactly one window is switched per call.
//!
//! Every proposal created in a proposal window is tracked. When that window
//! ends the tracked proposals that are still `Created` become `Active`; when
//! the following voting window ends the ones still `Active` become
//! `VotingFinished`. The list is bounded so a rollover has bounded cost.

use crate::error::GovernanceError;
use crate::proposal::ProposalState;
use crate::registry::ProposalRegistry;
use civitas_types::{ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Proposal,
    Voting,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Self::Proposal => Self::Voting,
            Self::Voting => Self::Proposal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposal => "proposal",
            Self::Voting => "voting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current window. `end == start + duration` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoPhase {
    pub start: Timestamp,
    pub end: Timestamp,
    pub phase: Phase,
}

impl DaoPhase {
    fn first(start: Timestamp, duration_secs: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(duration_secs),
            phase: Phase::Proposal,
        }
    }

    fn next(&self, duration_secs: u64) -> Self {
        let start = self.end.saturating_add(1);
        Self {
            start,
            end: start.saturating_add(duration_secs),
            phase: self.phase.flipped(),
        }
    }
}

/// Undo record for one rollover.
///
/// Operations that trigger a rollover and then fail hand it back to
/// [`PhaseScheduler::revert`] so the whole call leaves no trace.
#[derive(Debug)]
pub struct Rollover {
    previous: DaoPhase,
    /// The tracked list as it was, when the rollover cleared it.
    cleared: Option<Vec<ProposalId>>,
    /// Proposals moved by the bulk transition, with their prior state.
    moved: Vec<(ProposalId, ProposalState)>,
    pub current: DaoPhase,
}

impl Rollover {
    pub fn moved(&self) -> impl Iterator<Item = &ProposalId> {
        self.moved.iter().map(|(id, _)| id)
    }
}

#[derive(Debug)]
pub struct PhaseScheduler {
    current: DaoPhase,
    duration_secs: u64,
    tracked: Vec<ProposalId>,
    max_tracked: usize,
}

impl PhaseScheduler {
    /// Start with a proposal window beginning at `start`.
    pub fn new(start: Timestamp, duration_secs: u64, max_tracked: usize) -> Self {
        Self {
            current: DaoPhase::first(start, duration_secs),
            duration_secs,
            tracked: Vec::new(),
            max_tracked,
        }
    }

    pub(crate) fn restore(
        current: DaoPhase,
        tracked: Vec<ProposalId>,
        duration_secs: u64,
        max_tracked: usize,
    ) -> Self {
        Self {
            current,
            duration_secs,
            tracked,
            max_tracked,
        }
    }

    pub fn current(&self) -> DaoPhase {
        self.current
    }

    pub fn phase(&self) -> Phase {
        self.current.phase
    }

    pub fn tracked(&self) -> &[ProposalId] {
        &self.tracked
    }

    pub fn max_tracked(&self) -> usize {
        self.max_tracked
    }

    pub fn has_capacity(&self) -> bool {
        self.tracked.len() < self.max_tracked
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.current.end
    }

    pub fn require(&self, required: Phase) -> Result<(), GovernanceError> {
        if self.current.phase == required {
            Ok(())
        } else {
            Err(GovernanceError::UnavailableInCurrentPhase {
                required,
                current: self.current.phase,
            })
        }
    }

    /// Track a proposal created in the current window. Capacity must have been
    /// checked with [`has_capacity`](Self::has_capacity).
    pub(crate) fn track(&mut self, id: ProposalId) {
        debug_assert!(self.has_capacity());
        self.tracked.push(id);
    }

    /// Switch to the next window if the current one has ended.
    pub fn advance(&mut self, now: Timestamp, registry: &mut ProposalRegistry) -> Option<Rollover> {
        if !self.is_due(now) {
            return None;
        }

        let previous = self.current;
        let (from, to) = match previous.phase {
            Phase::Proposal => (ProposalState::Created, ProposalState::Active),
            Phase::Voting => (ProposalState::Active, ProposalState::VotingFinished),
        };
        let moved: Vec<_> = self
            .tracked
            .iter()
            .filter(|id| registry.transition(id, from, to))
            .map(|id| (*id, from))
            .collect();

        self.current = previous.next(self.duration_secs);
        let cleared = match self.current.phase {
            Phase::Proposal => Some(std::mem::take(&mut self.tracked)),
            Phase::Voting => None,
        };

        Some(Rollover {
            previous,
            cleared,
            moved,
            current: self.current,
        })
    }

    pub fn revert(&mut self, rollover: Rollover, registry: &mut ProposalRegistry) {
        for (id, state) in rollover.moved {
            registry.set_state(&id, state);
        }
        if let Some(tracked) = rollover.cleared {
            self.tracked = tracked;
        }
        self.current = rollover.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::{Payload, Proposal};
    use civitas_types::{Address, Amount};

    const DAY: u64 = 86_400;

    fn add_proposal(registry: &mut ProposalRegistry, scheduler: &mut PhaseScheduler, seed: u8) -> ProposalId {
        let id = ProposalId::new([seed; 32]);
        let proposal = Proposal {
            proposer: Address::from_low_u64(1),
            state: ProposalState::Created,
            targets: vec![Address::from_low_u64(2)],
            values: vec![Amount::ZERO],
            payloads: vec![Payload::Call(vec![seed])],
            description: format!("proposal {seed}"),
        };
        registry.insert(id, proposal).unwrap();
        scheduler.track(id);
        id
    }

    #[test]
    fn first_window_is_proposal() {
        let scheduler = PhaseScheduler::new(Timestamp::new(1_000), DAY, 100);
        let current = scheduler.current();
        assert_eq!(current.phase, Phase::Proposal);
        assert_eq!(current.end.as_secs(), current.start.as_secs() + DAY);
    }

    #[test]
    fn advance_before_end_is_noop() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(1_000), DAY, 100);
        let before = scheduler.current();
        for t in [1_000, 1_000 + DAY / 2, 1_000 + DAY - 1] {
            assert!(scheduler.advance(Timestamp::new(t), &mut registry).is_none());
        }
        assert_eq!(scheduler.current(), before);
    }

    #[test]
    fn advance_switches_exactly_one_window() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(1_000), DAY, 100);
        // far past several windows: still only one flip per call
        let now = Timestamp::new(1_000 + 10 * DAY);
        let rollover = scheduler.advance(now, &mut registry).unwrap();
        assert_eq!(rollover.current.phase, Phase::Voting);
        assert_eq!(rollover.current.start.as_secs(), 1_000 + DAY + 1);
        assert_eq!(rollover.current.end.as_secs(), 1_000 + 2 * DAY + 1);
    }

    #[test]
    fn full_cycle_moves_tracked_proposals_forward() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, 100);
        let id = add_proposal(&mut registry, &mut scheduler, 1);

        scheduler.advance(Timestamp::new(DAY), &mut registry).unwrap();
        assert_eq!(registry.state_of(&id), ProposalState::Active);
        assert_eq!(scheduler.tracked(), &[id]);

        let end = scheduler.current().end;
        scheduler.advance(end, &mut registry).unwrap();
        assert_eq!(registry.state_of(&id), ProposalState::VotingFinished);
        assert_eq!(scheduler.phase(), Phase::Proposal);
        assert!(scheduler.tracked().is_empty());
    }

    #[test]
    fn canceled_proposals_are_not_resurrected() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, 100);
        let id = add_proposal(&mut registry, &mut scheduler, 1);
        registry.set_state(&id, ProposalState::Canceled);

        let rollover = scheduler.advance(Timestamp::new(DAY), &mut registry).unwrap();
        assert_eq!(rollover.moved().count(), 0);
        assert_eq!(registry.state_of(&id), ProposalState::Canceled);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, 2);
        add_proposal(&mut registry, &mut scheduler, 1);
        assert!(scheduler.has_capacity());
        add_proposal(&mut registry, &mut scheduler, 2);
        assert!(!scheduler.has_capacity());
    }

    #[test]
    fn large_cap_allocates_nothing_up_front() {
        let scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, usize::MAX);
        assert!(scheduler.tracked().is_empty());
        assert!(scheduler.has_capacity());
    }

    #[test]
    fn revert_restores_everything() {
        let mut registry = ProposalRegistry::new();
        let mut scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, 100);
        let id = add_proposal(&mut registry, &mut scheduler, 1);
        scheduler.advance(Timestamp::new(DAY), &mut registry).unwrap();
        let voting = scheduler.current();

        let rollover = scheduler.advance(voting.end, &mut registry).unwrap();
        assert!(scheduler.tracked().is_empty());
        scheduler.revert(rollover, &mut registry);

        assert_eq!(scheduler.current(), voting);
        assert_eq!(scheduler.tracked(), &[id]);
        assert_eq!(registry.state_of(&id), ProposalState::Active);
    }

    #[test]
    fn require_reports_both_phases() {
        let scheduler = PhaseScheduler::new(Timestamp::new(0), DAY, 100);
        assert!(scheduler.require(Phase::Proposal).is_ok());
        match scheduler.require(Phase::Voting) {
            Err(GovernanceError::UnavailableInCurrentPhase { required, current }) => {
                assert_eq!(required, Phase::Voting);
                assert_eq!(current, Phase::Proposal);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
