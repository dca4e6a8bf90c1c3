//! Governance proposals and their lifecycle states.

use crate::error::GovernanceError;
use civitas_crypto::{blake2b_256, hash_to_proposal_id};
use civitas_types::{Address, Amount, ProposalId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a proposal.
///
/// States only move forward:
/// `Created → {Canceled | Active} → VotingFinished → {Accepted | Declined} → Executed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// No proposal with this id exists.
    None,
    /// Submitted in the current proposal window, still cancelable.
    Created,
    /// Open for voting.
    Active,
    /// The voting window ended; waiting for `finalize`.
    VotingFinished,
    Accepted,
    Declined,
    Canceled,
    /// Operations ran successfully. Terminal.
    Executed,
}

impl ProposalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Created => "created",
            Self::Active => "active",
            Self::VotingFinished => "voting_finished",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Canceled => "canceled",
            Self::Executed => "executed",
        }
    }

    /// Position along the lifecycle; a transition never lowers it.
    pub fn rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Created => 1,
            Self::Active | Self::Canceled => 2,
            Self::VotingFinished => 3,
            Self::Accepted | Self::Declined => 4,
            Self::Executed => 5,
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A privileged configuration change the engine applies to itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceCall {
    SetCreateProposalFee(Amount),
}

impl GovernanceCall {
    fn selector(&self) -> u8 {
        match self {
            Self::SetCreateProposalFee(_) => 0,
        }
    }

    fn encode_args(&self, buf: &mut Vec<u8>) {
        match self {
            Self::SetCreateProposalFee(fee) => buf.extend_from_slice(&fee.raw().to_be_bytes()),
        }
    }
}

/// What a single proposal action does when executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Opaque call data handed to the call host for an external target.
    Call(Vec<u8>),
    /// A privileged self-call into the engine's own configuration.
    Governance(GovernanceCall),
}

impl Payload {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Call(data) => {
                buf.push(0);
                put_len(buf, data.len());
                buf.extend_from_slice(data);
            }
            Self::Governance(call) => {
                buf.push(1);
                buf.push(call.selector());
                call.encode_args(buf);
            }
        }
    }
}

/// One (target, value, payload) triple of a proposal's batch.
#[derive(Clone, Copy, Debug)]
pub struct ProposalAction<'a> {
    pub target: &'a Address,
    pub value: Amount,
    pub payload: &'a Payload,
}

/// A stored governance proposal. Never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: Address,
    pub state: ProposalState,
    pub targets: Vec<Address>,
    pub values: Vec<Amount>,
    pub payloads: Vec<Payload>,
    pub description: String,
}

impl Proposal {
    /// The batch in declared order.
    pub fn actions(&self) -> impl Iterator<Item = ProposalAction<'_>> {
        self.targets
            .iter()
            .zip(&self.values)
            .zip(&self.payloads)
            .map(|((target, value), payload)| ProposalAction {
                target,
                value: *value,
                payload,
            })
    }
}

/// The content a proposer submits; hashing it yields the proposal id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub targets: Vec<Address>,
    pub values: Vec<Amount>,
    pub payloads: Vec<Payload>,
    pub description: String,
}

impl ProposalRequest {
    /// Check the batch shape and that privileged payloads address the engine.
    pub fn validate(&self, engine_address: &Address) -> Result<(), GovernanceError> {
        if self.targets.is_empty() {
            return Err(GovernanceError::InvalidArgument(
                "proposal must contain at least one action".into(),
            ));
        }
        if self.targets.len() != self.values.len() || self.targets.len() != self.payloads.len() {
            return Err(GovernanceError::InvalidArgument(format!(
                "length mismatch: {} targets, {} values, {} payloads",
                self.targets.len(),
                self.values.len(),
                self.payloads.len()
            )));
        }
        for (index, ((target, value), payload)) in self
            .targets
            .iter()
            .zip(&self.values)
            .zip(&self.payloads)
            .enumerate()
        {
            match payload {
                Payload::Governance(_) if target != engine_address => {
                    return Err(GovernanceError::InvalidArgument(format!(
                        "action {index}: governance payload must target the engine"
                    )));
                }
                Payload::Governance(_) if !value.is_zero() => {
                    return Err(GovernanceError::InvalidArgument(format!(
                        "action {index}: governance payload cannot carry value"
                    )));
                }
                Payload::Call(_) if target == engine_address => {
                    return Err(GovernanceError::InvalidArgument(format!(
                        "action {index}: calls into the engine must use a governance payload"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn id(&self) -> ProposalId {
        hash_proposal(&self.targets, &self.values, &self.payloads, &self.description)
    }

    pub(crate) fn into_proposal(self, proposer: Address) -> Proposal {
        Proposal {
            proposer,
            state: ProposalState::Created,
            targets: self.targets,
            values: self.values,
            payloads: self.payloads,
            description: self.description,
        }
    }
}

/// Deterministic proposal identifier.
///
/// Blake2b-256 over a length-prefixed encoding of the targets, the values
/// (16-byte big-endian), the tagged payloads and the Blake2b-256 digest of the
/// description. Any change to any field, including order, changes the id.
pub fn hash_proposal(
    targets: &[Address],
    values: &[Amount],
    payloads: &[Payload],
    description: &str,
) -> ProposalId {
    let mut buf = Vec::with_capacity(64 + targets.len() * 52);

    put_len(&mut buf, targets.len());
    for target in targets {
        buf.extend_from_slice(target.as_bytes());
    }

    put_len(&mut buf, values.len());
    for value in values {
        buf.extend_from_slice(&value.raw().to_be_bytes());
    }

    put_len(&mut buf, payloads.len());
    for payload in payloads {
        payload.encode(&mut buf);
    }

    buf.extend_from_slice(&blake2b_256(description.as_bytes()));
    hash_to_proposal_id(&buf)
}

fn put_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as u64).to_le_bytes());
}
