//! ChronoFlow CLI.
//!
//! # Commands
//! ```text
//! chronoflow deploy          [--artifacts <dir>] [--from <addr>] [--out <path>]
//! chronoflow manifest        [--out <path>] [--hooks-out <path>]
//! chronoflow addresses
//! chronoflow interface       <contract> [--json]
//! chronoflow read            <contract> <function> [args...]
//! chronoflow write           <contract> <function> [args...] --from <addr> [--value <wei>]
//! chronoflow next-stream-id
//! chronoflow stream          <id>
//! chronoflow listing         <id>
//! ```

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use chronoflow_client::{chrono_flow_core, marketplace, Client};
use chronoflow_core::{ChronoFlowConfig, ContractKind, HookManifest, NetworkConfig};
use chronoflow_deploy::{default_addresses_path, deploy_network};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod cmd_contract;
mod logging;

const DEFAULT_CONFIG: &str = "chronoflow.yaml";

#[derive(Parser)]
#[command(
    name = "chronoflow",
    about = "Deploy and call the ChronoFlow streaming-payment contracts",
    long_about = "
ChronoFlow CLI: deploy StreamNFT, ChronoFlowCore and ChronoFlowMarketplace,
inspect their interfaces and call them over JSON-RPC.

Writes are signed by the node (eth_sendTransaction); the --from account must
be unlocked on the node.

ENVIRONMENT VARIABLES:
  CHRONOFLOW_NETWORK   network to use (default: somnia-testnet)
  CHRONOFLOW_RPC_URL   RPC URL override for the selected network
  RUST_LOG             log filter, replaces the configured levels
",
    version
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Network name from the configuration
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// RPC URL override for the selected network
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and link the three contracts, then print their addresses
    Deploy {
        /// Directory holding compiled artifacts (default: deploy.artifacts_dir)
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Deploying account (default: the node's first account)
        #[arg(long)]
        from: Option<Address>,
        /// Deployed-addresses file to write
        /// (default: ignition/deployments/chain-<id>/deployed_addresses.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print or write the hook-generation manifest
    Manifest {
        /// Write the manifest here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output path recorded for the generated hooks
        #[arg(long)]
        hooks_out: Option<PathBuf>,
    },

    /// Print the resolved address book of the network
    Addresses,

    /// List a contract's entry points
    Interface {
        /// StreamNFT, ChronoFlowCore or ChronoFlowMarketplace (or nft/core/marketplace)
        contract: ContractKind,
        /// Print the raw ABI JSON
        #[arg(long)]
        json: bool,
    },

    /// Call a read-only function
    Read {
        contract: ContractKind,
        function: String,
        args: Vec<String>,
        /// Contract address (default: from the address book)
        #[arg(long)]
        address: Option<Address>,
    },

    /// Send a state-changing transaction
    Write {
        contract: ContractKind,
        function: String,
        args: Vec<String>,
        /// Sending account, unlocked on the node
        #[arg(long)]
        from: Address,
        /// Wei to send with a payable function
        #[arg(long, value_parser = cmd_contract::parse_wei)]
        value: Option<U256>,
        /// Contract address (default: from the address book)
        #[arg(long)]
        address: Option<Address>,
    },

    /// Print ChronoFlowCore.nextStreamId()
    #[command(name = "next-stream-id")]
    NextStreamId,

    /// Print a stream record
    Stream { id: U256 },

    /// Print a marketplace listing
    Listing { id: U256 },
}

/// Load the config file if present, then apply environment and flag overrides.
fn load_config(
    path: &Path,
    network: Option<String>,
    rpc_url: Option<String>,
) -> Result<ChronoFlowConfig> {
    let mut config = if path.exists() {
        ChronoFlowConfig::load(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        ChronoFlowConfig::default()
    };
    config.apply_env(network, rpc_url);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config, cli.network, cli.rpc_url)?;
    if cli.verbose {
        config.log.level = "debug".into();
    }
    logging::init_tracing(&config.log);
    let network = config.network(None)?;
    tracing::debug!(network = %network.name, url = %network.rpc_url, "network selected");

    match cli.command {
        Commands::Deploy {
            artifacts,
            from,
            out,
        } => cmd_deploy(&network, &config, artifacts, from, out).await,

        Commands::Manifest { out, hooks_out } => cmd_manifest(&network, out, hooks_out),

        Commands::Addresses => {
            let book = network.address_book()?;
            println!("{}", serde_json::to_string_pretty(&book)?);
            Ok(())
        }

        Commands::Interface { contract, json } => cmd_contract::interface(contract, json),

        Commands::Read {
            contract,
            function,
            args,
            address,
        } => cmd_contract::read(&network, contract, &function, &args, address).await,

        Commands::Write {
            contract,
            function,
            args,
            from,
            value,
            address,
        } => {
            cmd_contract::write(&network, contract, &function, &args, address, from, value).await
        }

        Commands::NextStreamId => {
            let core = chrono_flow_core(&Client::connect(&network)?, &network.address_book()?);
            println!("{}", core.next_stream_id().await?);
            Ok(())
        }

        Commands::Stream { id } => {
            let core = chrono_flow_core(&Client::connect(&network)?, &network.address_book()?);
            let stream = core.streams(id).await?;
            if !stream.exists() {
                anyhow::bail!("stream {id} does not exist");
            }
            println!("{}", serde_json::to_string_pretty(&stream)?);
            Ok(())
        }

        Commands::Listing { id } => {
            let market = marketplace(&Client::connect(&network)?, &network.address_book()?);
            let listing = market.listings(id).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
    }
}

// Command implementations

async fn cmd_deploy(
    network: &NetworkConfig,
    config: &ChronoFlowConfig,
    artifacts: Option<PathBuf>,
    from: Option<Address>,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut deploy = config.deploy.clone();
    if let Some(dir) = artifacts {
        deploy.artifacts_dir = dir;
    }
    if from.is_some() {
        deploy.from = from;
    }
    deploy.addresses_out = match out.or(deploy.addresses_out) {
        Some(path) => Some(path),
        None => {
            let chain_id = match network.chain_id {
                Some(id) => id,
                None => Client::connect(network)?.eth().chain_id().await?,
            };
            Some(default_addresses_path(chain_id))
        }
    };

    let deployment = deploy_network(network, &deploy)
        .await
        .context("ChronoFlow deployment failed")?;

    let book = &deployment.addresses;
    println!("ChronoFlow deployment completed!");
    println!("StreamNFT deployed to:             {}", book.stream_nft);
    println!("ChronoFlowCore deployed to:        {}", book.core);
    println!("ChronoFlowMarketplace deployed to: {}", book.marketplace);
    if let Some(path) = &deploy.addresses_out {
        println!("Addresses written to {}", path.display());
    }
    Ok(())
}

fn cmd_manifest(
    network: &NetworkConfig,
    out: Option<PathBuf>,
    hooks_out: Option<PathBuf>,
) -> Result<()> {
    let mut manifest = HookManifest::from_network(network)?;
    if let Some(path) = hooks_out {
        manifest = manifest.with_out(path);
    }
    match out {
        Some(path) => manifest.write(&path)?,
        None => println!("{}", manifest.to_json()?),
    }
    Ok(())
}
