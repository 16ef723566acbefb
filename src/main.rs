//! Price feed reader
//!
//! Command-line client for oracle price consumer contracts on Aurora networks.
//! Features:
//! - Wallet connection over the EIP-1193 JSON-RPC bridge (e.g. Frame)
//! - Network detection, switching and chain registration
//! - Contract binding through the wallet with public RPC fallback
//! - Per-pair price reads with fixed-exponent display and provenance tags

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alloy::primitives::Address;
use pricefeed_chain::{JsonRpcWallet, PriceFeedError, DEFAULT_WALLET_URL};
use pricefeed_core::config::{env, DEFAULT_DEPLOYMENTS_DIR};
use pricefeed_core::{
    format_price, load_registry, normalize, ConfigPaths, DeploymentRecord, Notice,
    PriceFeedClient, DISPLAY_EXPONENT,
};

#[derive(Debug, Parser)]
#[command(name = "pricefeed", version, about = "Read oracle price feeds on Aurora networks")]
struct Cli {
    /// Wallet JSON-RPC endpoint
    #[arg(long, global = true, env = env::WALLET_RPC_URL, default_value = DEFAULT_WALLET_URL)]
    wallet_url: String,

    /// Directory containing networks.toml
    #[arg(long, global = true, env = env::CONFIG_DIR, default_value = "config")]
    config_dir: PathBuf,

    /// Directory containing deployment records
    #[arg(long, global = true, env = env::DEPLOYMENTS_DIR, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    deployments_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List configured networks
    Networks,
    /// Probe the wallet for accounts and chain
    Status,
    /// Ask the wallet to authorize an account
    Connect,
    /// Move the wallet to a configured network
    Switch { network: String },
    /// Show what chain the wallet reports
    DebugNetwork,
    /// Connect, switch, bind the contract and read every configured pair
    Prices {
        #[command(flatten)]
        target: Target,
        /// Also report the feed registry and per-pair feed presence
        #[arg(long)]
        inspect: bool,
    },
    /// Read the network's convenience getters
    Convenience {
        #[command(flatten)]
        target: Target,
    },
    /// Check bytecode presence of an address on every configured network
    Locate { address: String },
    /// Read or write deployment records
    Deployment {
        #[command(subcommand)]
        action: DeploymentCommand,
    },
}

#[derive(Debug, clap::Args)]
struct Target {
    /// Network key (defaults to the wallet's network)
    #[arg(long, env = env::PRICEFEED_NETWORK)]
    network: Option<String>,
    /// Contract address (defaults to the network's configured contract)
    #[arg(long)]
    contract: Option<String>,
    /// Read through the public RPC without a wallet
    #[arg(long)]
    direct: bool,
}

#[derive(Debug, Subcommand)]
enum DeploymentCommand {
    /// Print the record for a network
    Show { network: String },
    /// Record a deployed contract for a network
    Record {
        network: String,
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        deployer: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pricefeed_core=debug,pricefeed_chain=debug")),
        )
        .init();

    let cli = Cli::parse();

    let paths = ConfigPaths {
        config_dir: Some(cli.config_dir.clone()),
        deployments_dir: cli.deployments_dir.clone(),
    };
    let registry = load_registry(&paths)?;

    if let Command::Deployment { action } = &cli.command {
        return run_deployment(action, &paths, &registry);
    }
    if let Command::Networks = &cli.command {
        print_networks(&registry);
        return Ok(());
    }

    let wallet = Arc::new(JsonRpcWallet::new(&cli.wallet_url)?);
    info!(wallet = %cli.wallet_url, "Using wallet endpoint");
    let mut client = PriceFeedClient::new(registry, wallet);

    match cli.command {
        Command::Status => {
            report(client.initialize().await)?;
            print_state(&client);
        }
        Command::Connect => {
            report(client.connect_wallet().await)?;
            print_state(&client);
        }
        Command::Switch { network } => {
            client.initialize().await;
            report(client.switch_network(&network).await)?;
        }
        Command::DebugNetwork => {
            let info = client.debug_network().await?;
            println!("Chain ID (hex):     {}", info.chain_id_hex);
            println!("Chain ID (decimal): {}", info.chain_id);
            println!(
                "net_version:        {}",
                info.net_version.as_deref().unwrap_or("unavailable")
            );
            println!(
                "Matches network:    {}",
                info.matched.as_deref().unwrap_or("none")
            );
            for key in &info.disputed_by {
                println!("Warning: chain id is disputed for {key}");
            }
        }
        Command::Prices { target, inspect } => {
            prepare(&mut client, &target).await?;
            let notice = client.fetch_prices().await;
            print_prices(&client);
            report(notice)?;
            if inspect {
                print_inspection(&client).await?;
            }
        }
        Command::Convenience { target } => {
            prepare(&mut client, &target).await?;
            for reading in client.read_convenience().await? {
                match reading.result {
                    Ok(raw) => {
                        let value = normalize(raw, DISPLAY_EXPONENT).value;
                        println!("{:<20} {}", reading.getter, format_price(value, None));
                    }
                    Err(e) => println!("{:<20} Error: {e}", reading.getter),
                }
            }
        }
        Command::Locate { address } => {
            let address: Address = address
                .parse()
                .with_context(|| format!("Invalid address {address}"))?;
            for location in client.locate(address).await {
                let explorer = client
                    .registry()
                    .get(&location.network)
                    .map(|n| format!("{}/address/{address}", n.descriptor.explorer_url))
                    .unwrap_or_default();
                match &location.code_len {
                    Ok(len) if *len > 0 => {
                        println!("{:<16} deployed ({len} bytes) {explorer}", location.network)
                    }
                    Ok(_) => println!("{:<16} no bytecode", location.network),
                    Err(e) => println!("{:<16} lookup failed: {e}", location.network),
                }
            }
        }
        Command::Networks | Command::Deployment { .. } => {}
    }

    Ok(())
}

/// Bring the client to `ContractReady` for the requested target.
async fn prepare(client: &mut PriceFeedClient, target: &Target) -> Result<()> {
    if target.direct {
        if let Some(network) = &target.network {
            report(client.select_network(network))?;
        }
        if let Some(contract) = &target.contract {
            report(client.set_contract_address(contract))?;
        }
        return report(client.load_contract_direct().await);
    }

    report(client.initialize().await)?;
    if client.state().wallet_account.is_none() {
        report(client.connect_wallet().await)?;
    }

    let network = target
        .network
        .clone()
        .unwrap_or_else(|| client.state().selected_network.clone());
    report(client.switch_network(&network).await)?;

    if let Some(contract) = &target.contract {
        report(client.set_contract_address(contract))?;
    }
    report(client.load_contract().await)
}

fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        bail!(notice.message);
    }
    println!("{notice}");
    Ok(())
}

fn print_networks(registry: &pricefeed_core::NetworkRegistry) {
    let default = registry.default_network().key().to_string();
    for network in registry.iter() {
        let d = &network.descriptor;
        let marker = if network.key() == default { "*" } else { " " };
        println!(
            "{marker} {:<16} {:<28} {} ({})  abi={}  pairs={}",
            network.key(),
            d.name,
            d.chain_id_hex(),
            d.chain_id,
            network.abi,
            network.pairs.len()
        );
        match network.contract {
            Some(contract) => println!("    contract {contract}"),
            None => println!("    contract (not deployed)"),
        }
        if !d.disputed_chain_ids.is_empty() {
            println!("    disputed chain ids {:?}", d.disputed_chain_ids);
        }
    }
}

fn print_state(client: &PriceFeedClient) {
    let state = client.state();
    println!("Phase:    {}", state.phase());
    println!(
        "Account:  {}",
        state.wallet_account.as_deref().unwrap_or("(none)")
    );
    println!("Network:  {}", state.selected_network);
    match state.contract_address {
        Some(contract) => println!("Contract: {contract}"),
        None => println!("Contract: (none)"),
    }
}

fn print_prices(client: &PriceFeedClient) {
    for row in client.prices() {
        println!("{:<14} {:<40} {}", row.pair, row.price, row.timestamp);
    }
}

async fn print_inspection(client: &PriceFeedClient) -> Result<(), PriceFeedError> {
    let inspection = client.inspect_feeds().await?;
    match inspection.registry {
        Ok(registry) => println!("Feed registry: {registry}"),
        Err(e) => println!("Feed registry: Error: {e}"),
    }
    for (pair, exists) in inspection.pairs {
        match exists {
            Ok(exists) => println!("{pair:<14} feed exists: {exists}"),
            Err(e) => println!("{pair:<14} feed exists: Error: {e}"),
        }
    }
    Ok(())
}

fn run_deployment(
    action: &DeploymentCommand,
    paths: &ConfigPaths,
    registry: &pricefeed_core::NetworkRegistry,
) -> Result<()> {
    match action {
        DeploymentCommand::Show { network } => {
            registry.require(network)?;
            match DeploymentRecord::load(&paths.deployments_dir, network)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No deployment recorded for {network}"),
            }
        }
        DeploymentCommand::Record {
            network,
            address,
            deployer,
        } => {
            let resolved = registry.require(network)?;
            let address: Address = address
                .parse()
                .with_context(|| format!("Invalid address {address}"))?;
            let record = DeploymentRecord::new(
                network,
                resolved.descriptor.chain_id,
                address,
                deployer,
            );
            let path = record.save(&paths.deployments_dir)?;
            println!("Recorded {address} for {network} in {}", path.display());
        }
    }
    Ok(())
}
