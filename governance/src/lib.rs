//! Phased, stake-weighted governance.
//!
//! Time is split into alternating proposal and voting windows. Proposals are
//! created (for an exact fee) during a proposal window, voted on by active
//! validators during the following voting window, and finalized once that
//! window has ended: accepted when at least two thirds of the stake that
//! voted said yes. Accepted proposals execute their batch of actions as one
//! unit, including privileged changes to the engine's own configuration.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod execution;
pub mod oracle;
pub mod phase;
pub mod proposal;
pub mod registry;
pub mod snapshot;
pub mod tally;
pub mod treasury;
pub mod voting;

pub use config::{GovernanceConfig, MAX_PROPOSALS_PER_WINDOW_LIMIT};
pub use engine::{Collaborators, GovernanceEngine};
pub use error::{ErrorKind, GovernanceError};
pub use events::{EventBus, GovernanceEvent};
pub use execution::{CallError, CallHost, Privileged};
pub use oracle::{is_active_validator, StakingOracle, ValidatorOracle};
pub use phase::{DaoPhase, Phase, PhaseScheduler};
pub use proposal::{hash_proposal, GovernanceCall, Payload, Proposal, ProposalRequest, ProposalState};
pub use registry::{ProposalRegistry, ProposalStatistic};
pub use snapshot::GovernanceSnapshot;
pub use tally::{ChoiceTally, VotingResult};
pub use treasury::{Treasury, TreasuryError};
pub use voting::{VoteBook, VoteChoice, VoteRecord};
