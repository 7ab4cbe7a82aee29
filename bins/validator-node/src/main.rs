//! Validator Node - Burn Policy
//!
//! Syncs the metagraph every tick and periodically assigns the full weight
//! to the subnet owner's UID. Stops cleanly on Ctrl+C.

use anyhow::Result;
use burn_bittensor::{BittensorConfig, SubmitWait, SubtensorClient};
use burn_validator::{BurnSchedule, StateStore, Validator, ValidatorConfig, VERSION};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Database directory inside the data dir
const STATE_DB: &str = "validator.db";

// ==================== CLI ====================

#[derive(Parser, Debug)]
#[command(name = "validator-node")]
#[command(about = "Burn Validator - assigns all weight to the subnet owner")]
struct Args {
    /// Secret key (seed phrase, hex seed or //URI)
    #[arg(short = 'k', long, env = "VALIDATOR_SECRET_KEY")]
    secret_key: Option<String>,

    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Keep state in a temporary database instead of the data directory
    #[arg(long)]
    ephemeral: bool,

    /// JSON config file with `bittensor` and `validator` sections
    #[arg(short, long, env = "VALIDATOR_CONFIG")]
    config: Option<PathBuf>,

    #[arg(
        long,
        env = "SUBTENSOR_ENDPOINT",
        default_value = "wss://entrypoint-finney.opentensor.ai:443"
    )]
    subtensor_endpoint: String,

    #[arg(long, env = "NETUID", default_value = "1")]
    netuid: u16,

    /// Version key (defaults to one derived from the crate version)
    #[arg(long, env = "VERSION_KEY")]
    version_key: Option<u64>,

    /// Seconds between burns
    #[arg(long, default_value = "1200")]
    burn_interval_secs: u64,

    /// Blocks between burns (switches to the block schedule)
    #[arg(long)]
    burn_interval_blocks: Option<u64>,

    /// Milliseconds between loop iterations
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// How long weight extrinsics wait: none, inclusion or finalization
    #[arg(long, default_value = "none")]
    wait: SubmitWait,
}

/// Layout of the `--config` file
#[derive(Debug, Deserialize)]
struct NodeConfig {
    bittensor: BittensorConfig,
    #[serde(default)]
    validator: ValidatorConfig,
}

impl NodeConfig {
    fn from_args(args: &Args) -> Self {
        let schedule = match args.burn_interval_blocks {
            Some(interval) => BurnSchedule::Blocks { interval },
            None => BurnSchedule::WallClock {
                interval_secs: args.burn_interval_secs,
            },
        };

        Self {
            bittensor: BittensorConfig {
                endpoint: args.subtensor_endpoint.clone(),
                netuid: args.netuid,
            },
            validator: ValidatorConfig {
                schedule,
                tick_ms: args.tick_ms,
                version_key: args.version_key,
                wait: args.wait,
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }
}

fn load_config(args: &Args) -> Result<NodeConfig> {
    match args.config.as_deref() {
        Some(path) => {
            info!("Loading config from {}", path.display());
            NodeConfig::from_file(path)
        }
        None => Ok(NodeConfig::from_args(args)),
    }
}

fn open_store(args: &Args) -> Result<StateStore> {
    if args.ephemeral {
        info!("Using temporary state store");
        return Ok(StateStore::temporary()?);
    }

    std::fs::create_dir_all(&args.data_dir)?;
    let data_dir = std::fs::canonicalize(&args.data_dir)?;
    Ok(StateStore::open(data_dir.join(STATE_DB))?)
}

// ==================== Main ====================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,validator_node=debug,burn_validator=debug,burn_bittensor=debug".into()
            }),
        )
        .init();

    let args = Args::parse();
    info!("Starting burn validator v{}", VERSION);

    let config = load_config(&args)?;
    info!(
        "Subtensor: {} (netuid {})",
        config.bittensor.endpoint, config.bittensor.netuid
    );

    let secret = args
        .secret_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("VALIDATOR_SECRET_KEY required"))?;

    let mut client = SubtensorClient::new(config.bittensor);
    client.set_signer(secret).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create Bittensor signer from secret key: {}. \
            A valid signer is required for weight submission.",
            e
        )
    })?;
    client.connect().await?;

    let store = open_store(&args)?;
    let mut validator = Validator::new(config.validator, client, store)?;

    info!("Burn validator running. Press Ctrl+C to stop.");
    validator.start().await?;

    info!("Stopped.");
    Ok(())
}
