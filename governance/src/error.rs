use crate::phase::Phase;
use crate::proposal::ProposalState;
use civitas_types::{Address, Amount, ProposalId};
use thiserror::Error;

/// Coarse failure classes. Every [`GovernanceError`] belongs to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Existence,
    StateConflict,
    PhaseConflict,
    Authorization,
    Resource,
    Storage,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fee mismatch: paid {paid}, required exactly {required}")]
    InsufficientFunds { paid: Amount, required: Amount },

    #[error("proposal limit of {limit} per window exceeded")]
    ProposalsLimitExceeded { limit: usize },

    #[error("proposal {0} already exists")]
    AlreadyExists(ProposalId),

    #[error("proposal {0} does not exist")]
    NotExist(ProposalId),

    #[error("only the proposer can cancel a proposal")]
    OnlyProposer,

    #[error("{0} is not an active validator")]
    OnlyValidators(Address),

    #[error("unexpected proposal state: expected {expected}, found {actual}")]
    UnexpectedState {
        expected: ProposalState,
        actual: ProposalState,
    },

    #[error("unavailable in the {current} phase (requires {required})")]
    UnavailableInCurrentPhase { required: Phase, current: Phase },

    #[error("action {index} failed: {reason}")]
    ExecutionFailed { index: usize, reason: String },

    #[error("fee transfer failed: {0}")]
    TransferFailed(String),

    #[error("arithmetic overflow in vote tally")]
    ArithmeticOverflow,

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] civitas_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::Config(_) => ErrorKind::InputValidation,
            Self::NotExist(_) | Self::AlreadyExists(_) => ErrorKind::Existence,
            Self::UnexpectedState { .. } => ErrorKind::StateConflict,
            Self::UnavailableInCurrentPhase { .. } => ErrorKind::PhaseConflict,
            Self::OnlyProposer | Self::OnlyValidators(_) => ErrorKind::Authorization,
            Self::InsufficientFunds { .. }
            | Self::ProposalsLimitExceeded { .. }
            | Self::ExecutionFailed { .. }
            | Self::TransferFailed(_)
            | Self::ArithmeticOverflow => ErrorKind::Resource,
            Self::Store(_) | Self::Serialization(_) => ErrorKind::Storage,
        }
    }
}

impl From<bincode::Error> for GovernanceError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
