//! # assetcli
//!
//! Command-line client for the Exocore asset, delegation and reward
//! precompiles.
//!
//! ## Usage
//!
//! ```bash
//! # Asset precompile (0x804)
//! assetcli deposit --staker 0x... --asset 0x... --amount 1000
//! assetcli withdraw --withdrawer 0x... --amount 1000
//! assetcli register-token --token 0x... --name USDT --decimals 6
//!
//! # Delegation precompile (0x805)
//! assetcli delegate --staker 0x... --operator exo1... --amount 1000
//! assetcli undelegate --staker 0x... --operator exo1... --amount 1000 --instant
//! assetcli self-delegate --staker 0x... --operator exo1...
//!
//! # Reward precompile (0x806)
//! assetcli claim-reward --withdrawer 0x... --amount 10
//!
//! # Read-only queries
//! assetcli query client-chains
//! assetcli query is-registered-client-chain --client-chain-id 101
//!
//! # Defaults
//! assetcli config --set-rpc http://localhost:8545 --set-asset 0x...
//! ```
//!
//! The signing key is read from `--private-key` or `EXO_PRIVATE_KEY`.

use clap::{Parser, Subcommand};
use exo_sdk::SimulationPolicy;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use config::Config;
pub use error::CliError;
pub use output::Output;

use commands::Session;

/// Exocore precompile client
#[derive(Parser, Debug)]
#[command(name = "assetcli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// RPC endpoint URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Hex private key of the signing account
    #[arg(long, global = true, env = "EXO_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Client chain id passed to every call
    #[arg(long, global = true)]
    network_id: Option<u32>,

    /// Gas limit of the transaction
    #[arg(long, global = true)]
    gas_limit: Option<u64>,

    /// Dry-run policy: warn, abort or skip
    #[arg(long, global = true)]
    simulation: Option<SimulationPolicy>,

    /// Return after broadcasting instead of waiting for the receipt
    #[arg(long, global = true)]
    no_wait: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    #[command(flatten)]
    Staking(commands::staking::StakingCommand),
    /// Read-only precompile queries
    #[command(subcommand)]
    Query(commands::query::QueryCommand),
    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set RPC URL
        #[arg(long)]
        set_rpc: Option<String>,
        /// Set network id
        #[arg(long)]
        set_network_id: Option<u32>,
        /// Set default asset id
        #[arg(long)]
        set_asset: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let json = cli.json;
    if let Err(e) = run(cli).await {
        if json {
            let mut body = serde_json::json!({
                "error": e.to_string(),
                "success": false
            });
            if let Some(destination) = e.destination() {
                body["destination"] = destination.to_hex().into();
            }
            if let Some(hash) = e.tx_hash() {
                body["tx_hash"] = hash.to_hex().into();
            }
            if let Some(stage) = e.stage() {
                body["stage"] = stage.into();
            }
            println!("{}", body);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load()?;

    if let Commands::Config {
        show,
        set_rpc,
        set_network_id,
        set_asset,
    } = cli.command
    {
        return handle_config(&mut config, show, set_rpc, set_network_id, set_asset, cli.json);
    }

    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(network_id) = cli.network_id {
        config.network_id = network_id;
    }
    if let Some(gas_limit) = cli.gas_limit {
        config.gas_limit = gas_limit;
    }

    let mut settings = config.to_settings()?;
    if let Some(policy) = cli.simulation {
        settings.simulation = policy;
    }

    tracing::debug!(
        rpc_url = %config.rpc_url,
        network_id = config.network_id,
        gas_limit = settings.gas_limit,
        simulation = %settings.simulation,
        "session ready"
    );
    let session = Session {
        config,
        settings,
        json: cli.json,
        private_key: cli.private_key,
        wait: !cli.no_wait,
    };

    match cli.command {
        Commands::Staking(cmd) => cmd.execute(&session).await,
        Commands::Query(cmd) => cmd.execute(&session).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn handle_config(
    config: &mut Config,
    show: bool,
    set_rpc: Option<String>,
    set_network_id: Option<u32>,
    set_asset: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let mut modified = false;

    if let Some(rpc) = set_rpc {
        config.rpc_url = rpc;
        modified = true;
    }

    if let Some(network_id) = set_network_id {
        config.network_id = network_id;
        modified = true;
    }

    if let Some(asset) = set_asset {
        // Reject identifiers the encoder would refuse later
        exo_sdk::codec::encode_identifier(&asset)?;
        config.default_asset_id = Some(asset);
        modified = true;
    }

    if modified {
        config.save()?;
        Output::new(json)
            .field("status", "saved")
            .message("Configuration saved")
            .print();
    } else if show {
        let path = Config::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let asset = config.default_asset_id.as_deref().unwrap_or("(none)");
        Output::new(json)
            .field("path", &path)
            .field("rpc_url", &config.rpc_url)
            .field_u64("network_id", u64::from(config.network_id))
            .field_opt("default_asset_id", config.default_asset_id.as_deref())
            .field_u64("gas_limit", config.gas_limit)
            .field_u64("confirm_timeout_secs", config.confirm_timeout_secs)
            .field("simulation", &config.simulation)
            .field("delegation_schema", &config.delegation_schema)
            .message(&format!(
                "Config file: {}\nRPC URL: {}\nNetwork ID: {}\nDefault asset: {}\nGas Limit: {}\nConfirm timeout: {}s\nSimulation: {}\nDelegation schema: {}",
                path,
                config.rpc_url,
                config.network_id,
                asset,
                config.gas_limit,
                config.confirm_timeout_secs,
                config.simulation,
                config.delegation_schema
            ))
            .print();
    } else {
        Output::new(json)
            .message("Use --show to display config, or --set-rpc/--set-network-id/--set-asset to modify")
            .print();
    }

    Ok(())
}
