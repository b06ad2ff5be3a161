//! chainreg CLI — bulk-register addresses in gas-bounded batches.
//!
//! Usage:
//! ```bash
//! # Calibrate the batch size against a 1M gas limit and register
//! chainreg register --file addresses.json --contract 0x...
//!
//! # Fixed batch size, no prompts
//! chainreg register --file addresses.json --contract 0x... --batch-size 150 --yes
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainreg_core::{CalibratorConfig, RegistrationWorkflow, RunConfig, WorkflowEvent};
use chainreg_evm::{ContractConfig, RegistryContract};

#[derive(Parser)]
#[command(
    name = "chainreg",
    about = "Bulk-register addresses into an on-chain registry in gas-bounded batches",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register every address of a JSON file
    Register {
        /// JSON array of addresses
        #[arg(long)]
        file: PathBuf,
        /// Registry contract address
        #[arg(long)]
        contract: Address,
        /// JSON-RPC endpoint
        #[arg(long, default_value = "http://localhost:8545")]
        node_url: String,
        /// Gas price in wei
        #[arg(long, default_value_t = 21_000_000_000)]
        gas_price: u128,
        /// Max gas for every batch transaction
        #[arg(long, default_value_t = 1_000_000)]
        gas_limit: u64,
        /// Fixed batch size; calibrated from --gas-limit when omitted
        #[arg(long)]
        batch_size: Option<usize>,
        /// Batch size assumed to exceed the block gas limit during calibration
        #[arg(long, default_value_t = 400)]
        upper_bound: usize,
        /// Submit addresses without checking which are already registered
        #[arg(long)]
        no_filter: bool,
        /// Answer yes to every prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Register {
            file,
            contract,
            node_url,
            gas_price,
            gas_limit,
            batch_size,
            upper_bound,
            no_filter,
            yes,
        } => {
            let addresses = read_addresses(&file)?;
            println!("Number of addresses: {}", addresses.len());

            let filter_registered = !no_filter
                && confirm(
                    "Would you like to filter out the addresses that are already registered?",
                    yes,
                )?;

            let run = RunConfig {
                resource_limit: gas_limit,
                batch_size,
                filter_registered,
                calibration: CalibratorConfig { upper_bound },
            };
            let contract_config = ContractConfig {
                rpc_url: node_url,
                gas_price,
                ..ContractConfig::new(contract)
            };

            cmd_register(contract_config, run, addresses, yes).await
        }
    }
}

async fn cmd_register(
    contract: ContractConfig,
    run: RunConfig,
    addresses: Vec<Address>,
    yes: bool,
) -> Result<()> {
    println!("Using node: {}", contract.rpc_url);
    let registry = RegistryContract::connect_http(contract)
        .await
        .context("failed to connect to the registry contract")?;

    let mut workflow = RegistrationWorkflow::new(registry).on_event(print_event);

    let plan = workflow.plan(&run, addresses).await?;
    println!(
        "Batch size: {}. Gas per batch: {}",
        plan.batch_config.size, plan.batch_config.resource_usage
    );
    println!("Number of unregistered addresses: {}", plan.address_count());
    println!("Number of batches/transactions: {}", plan.batch_count());

    if !confirm("Would you like to start registering addresses?", yes)? {
        return Ok(());
    }

    let summary = workflow.execute(&plan).await?;
    println!(
        "Registration succeeded: {} addresses in {} batches",
        summary.addresses_registered, summary.batches_submitted
    );
    Ok(())
}

fn print_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::AddressChecked {
            index,
            total,
            address,
            registered,
        } => {
            let status = if *registered { "registered" } else { "new" };
            println!("Registration status: {}/{} {address} {status}", index + 1, total);
        }
        WorkflowEvent::BatchSubmitted(progress) => {
            println!("Registered batches: {}/{}", progress.completed, progress.total);
        }
        WorkflowEvent::Calibrated { .. } | WorkflowEvent::Partitioned { .. } => {}
    }
}

fn read_addresses(path: &Path) -> Result<Vec<Address>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} must be a JSON array of addresses", path.display()))
}

fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
