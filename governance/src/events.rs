//! Notifications for off-system observers.

use crate::phase::Phase;
use crate::proposal::{Payload, ProposalState};
use crate::tally::VotingResult;
use crate::voting::VoteChoice;
use civitas_types::{Address, Amount, ProposalId, Timestamp};
use serde::Serialize;

/// Emitted once an operation has fully committed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        targets: Vec<Address>,
        values: Vec<Amount>,
        payloads: Vec<Payload>,
        description: String,
    },
    ProposalCanceled {
        id: ProposalId,
        proposer: Address,
        reason: String,
    },
    VoteCast {
        id: ProposalId,
        voter: Address,
        choice: VoteChoice,
        reason: String,
    },
    PhaseSwitched {
        phase: Phase,
        start: Timestamp,
        end: Timestamp,
    },
    ProposalFinalized {
        id: ProposalId,
        state: ProposalState,
        result: VotingResult,
    },
    ProposalExecuted {
        id: ProposalId,
        executor: Address,
    },
    CreateProposalFeeChanged {
        old: Amount,
        new: Amount,
    },
}

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the committing call; keep them fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&GovernanceEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
