//! Engine configuration with TOML file support.

use crate::error::GovernanceError;
use civitas_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One-time setup parameters for a [`GovernanceEngine`](crate::GovernanceEngine).
///
/// Loaded from TOML via [`GovernanceConfig::from_toml_file`] or built in code
/// (tests). Addresses and amounts are strings in TOML so that 20-byte
/// identifiers and u128 fees survive the trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// The engine's own account; governance payloads must target it.
    #[serde(default)]
    pub engine_address: Address,

    /// Validator registry the engine consults for vote eligibility.
    #[serde(default)]
    pub validator_oracle: Address,

    /// Staking ledger the engine consults at tally time.
    #[serde(default)]
    pub staking_oracle: Address,

    /// Receives every proposal creation fee.
    #[serde(default)]
    pub fee_sink: Address,

    /// Exact amount a proposer must pay.
    #[serde(default = "default_create_proposal_fee")]
    pub create_proposal_fee: Amount,

    /// Start of the first proposal window.
    #[serde(default)]
    pub start_time: Timestamp,

    /// Length of every window in seconds.
    #[serde(default = "default_phase_duration_secs")]
    pub phase_duration_secs: u64,

    /// Proposals that may be created in one window.
    #[serde(default = "default_max_proposals_per_window")]
    pub max_proposals_per_window: usize,
}

fn default_create_proposal_fee() -> Amount {
    Amount::new(1_000_000_000_000_000_000)
}

fn default_phase_duration_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// Upper bound for `max_proposals_per_window`; a rollover walks every
/// tracked proposal.
pub const MAX_PROPOSALS_PER_WINDOW_LIMIT: usize = 10_000;

fn default_max_proposals_per_window() -> usize {
    100
}

impl GovernanceConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GovernanceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GovernanceError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    /// Reject zero addresses, a zero fee, a start time before `now`, and a
    /// zero duration or cap.
    pub fn validate(&self, now: Timestamp) -> Result<(), GovernanceError> {
        for (name, address) in [
            ("engine_address", &self.engine_address),
            ("validator_oracle", &self.validator_oracle),
            ("staking_oracle", &self.staking_oracle),
            ("fee_sink", &self.fee_sink),
        ] {
            if address.is_zero() {
                return Err(GovernanceError::InvalidArgument(format!("{name} must not be zero")));
            }
        }
        if self.create_proposal_fee.is_zero() {
            return Err(GovernanceError::InvalidArgument(
                "create_proposal_fee must be greater than zero".into(),
            ));
        }
        if self.start_time < now {
            return Err(GovernanceError::InvalidArgument(format!(
                "start_time {} is in the past (now {now})",
                self.start_time
            )));
        }
        if self.phase_duration_secs == 0 {
            return Err(GovernanceError::InvalidArgument(
                "phase_duration_secs must be greater than zero".into(),
            ));
        }
        if self.max_proposals_per_window == 0 {
            return Err(GovernanceError::InvalidArgument(
                "max_proposals_per_window must be greater than zero".into(),
            ));
        }
        if self.max_proposals_per_window > MAX_PROPOSALS_PER_WINDOW_LIMIT {
            return Err(GovernanceError::InvalidArgument(format!(
                "max_proposals_per_window {} exceeds the limit of {MAX_PROPOSALS_PER_WINDOW_LIMIT}",
                self.max_proposals_per_window
            )));
        }
        Ok(())
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            engine_address: Address::ZERO,
            validator_oracle: Address::ZERO,
            staking_oracle: Address::ZERO,
            fee_sink: Address::ZERO,
            create_proposal_fee: default_create_proposal_fee(),
            start_time: Timestamp::EPOCH,
            phase_duration_secs: default_phase_duration_secs(),
            max_proposals_per_window: default_max_proposals_per_window(),
        }
    }
}
