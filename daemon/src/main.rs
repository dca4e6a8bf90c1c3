//! civitas command-line entry point for the governance engine.

use anyhow::Context;
use civitas_governance::{GovernanceConfig, GovernanceSnapshot, ProposalRequest};
use civitas_store_lmdb::environment::DEFAULT_MAP_SIZE;
use civitas_store_lmdb::LmdbEnvironment;
use civitas_types::{ProposalId, Timestamp};
use civitas_utils::{format_duration, init_logging, LogFormat};
use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "civitas", about = "Phased, stake-weighted governance engine")]
struct Cli {
    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "CIVITAS_LOG_FORMAT")]
    log_format: LogFormat,

    /// Log level filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info", env = "CIVITAS_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the configuration as TOML (the defaults unless --config is given).
    Config {
        /// TOML file to load and check.
        #[arg(long, env = "CIVITAS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Compute the id of a proposal described in a JSON file.
    HashProposal {
        /// JSON file holding `targets`, `values`, `payloads`, `description`.
        file: PathBuf,

        /// Also check the batch shape against this configuration.
        #[arg(long, env = "CIVITAS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show phase, statistic and fee of a persisted engine.
    Status {
        #[arg(long, default_value = "./civitas_data", env = "CIVITAS_DATA_DIR")]
        data_dir: PathBuf,
    },

    /// Show one persisted proposal, its voters and its tally.
    Proposal {
        #[arg(long, default_value = "./civitas_data", env = "CIVITAS_DATA_DIR")]
        data_dir: PathBuf,

        /// Proposal id, 0x-prefixed hex.
        id: ProposalId,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    match cli.command {
        Command::Config { config } => print_config(config.as_deref()),
        Command::HashProposal { file, config } => hash_proposal(&file, config.as_deref()),
        Command::Status { data_dir } => status(&data_dir),
        Command::Proposal { data_dir, id } => show_proposal(&data_dir, &id),
    }
}

fn print_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = match path {
        Some(path) => {
            let config = GovernanceConfig::from_toml_file(path)?;
            if let Err(e) = config.validate(Timestamp::now()) {
                tracing::warn!(error = %e, "configuration would be rejected at initialization");
            }
            config
        }
        None => GovernanceConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn hash_proposal(file: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let request: ProposalRequest = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", file.display()))?;
    if let Some(path) = config {
        let config = GovernanceConfig::from_toml_file(path)?;
        request.validate(&config.engine_address)?;
    }
    println!("{}", request.id());
    Ok(())
}

fn load_snapshot(data_dir: &Path) -> anyhow::Result<GovernanceSnapshot> {
    if !data_dir.is_dir() {
        anyhow::bail!("no data directory at {}", data_dir.display());
    }
    let env = LmdbEnvironment::open(data_dir, DEFAULT_MAP_SIZE)
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    let store = env.governance_store();
    Ok(GovernanceSnapshot::load(&store)?)
}

fn status(data_dir: &Path) -> anyhow::Result<()> {
    let snapshot = load_snapshot(data_dir)?;
    let now = Timestamp::now();
    let remaining = match now.secs_until(snapshot.phase.end) {
        0 => "due".to_string(),
        secs => format_duration(secs),
    };
    let report = json!({
        "phase": snapshot.phase,
        "phase_ends_in": remaining,
        "statistic": snapshot.statistic,
        "create_proposal_fee": snapshot.create_proposal_fee,
        "tracked_proposals": snapshot.tracked,
        "proposals": snapshot.proposals.len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn show_proposal(data_dir: &Path, id: &ProposalId) -> anyhow::Result<()> {
    let snapshot = load_snapshot(data_dir)?;
    let proposal = snapshot
        .proposals
        .iter()
        .find(|(pid, _)| pid == id)
        .map(|(_, proposal)| proposal)
        .with_context(|| format!("proposal {id} not found"))?;
    let ballots = snapshot
        .ballots
        .iter()
        .find(|(pid, _)| pid == id)
        .map(|(_, ballots)| ballots.as_slice())
        .unwrap_or(&[]);
    let result = snapshot
        .results
        .iter()
        .find(|(pid, _)| pid == id)
        .map(|(_, result)| result);

    let votes: Vec<_> = ballots
        .iter()
        .map(|(voter, record)| {
            json!({
                "voter": voter,
                "choice": record.choice,
                "timestamp": record.timestamp,
                "reason": record.reason,
            })
        })
        .collect();
    let report = json!({
        "id": id,
        "proposal": proposal,
        "votes": votes,
        "result": result,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
