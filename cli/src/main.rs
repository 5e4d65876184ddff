//! Liquidswap CLI - Quote and execute swaps on Liquidswap pools
//!
//! Prices trades against Liquidswap's uncorrelated pools and submits swaps
//! from a local wallet on Aptos networks (mainnet, testnet, devnet, local).

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod client;
mod config;
mod signer;
mod swap;

use config::NetworkConfig;

#[derive(Parser)]
#[command(name = "liquidswap")]
#[command(about = "Liquidswap CLI - Quote and execute constant-product swaps", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (mainnet, testnet, devnet, local)
    #[arg(short, long, default_value = "testnet")]
    network: String,

    /// Fullnode REST URL (overrides network default)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to wallet file
    #[arg(short, long)]
    wallet: Option<PathBuf>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the output of a swap without submitting it
    Rate {
        /// Token to sell
        from: String,

        /// Token to buy
        to: String,

        /// Amount to sell
        amount: f64,
    },

    /// Swap one token for another
    Swap {
        /// Token to sell
        from: String,

        /// Token to buy
        to: String,

        /// Amount to sell
        amount: f64,

        /// Minimum amount to receive (defaults to quote minus configured slippage)
        #[arg(long)]
        min_out: Option<f64>,
    },

    /// Show token balances
    Balance {
        /// Single token to show (all configured tokens if omitted)
        symbol: Option<String>,
    },

    /// Register a coin so the account can receive it
    Register {
        /// Token symbol
        symbol: String,
    },

    /// List configured tokens
    Tokens,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = NetworkConfig::new(
        &cli.network,
        cli.url.clone(),
        cli.wallet.clone(),
        cli.config.clone(),
    )?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "Node URL:".bright_cyan(), config.node_url);
        println!("{} {}", "Wallet:".bright_cyan(), config.wallet_path.display());
        if let Some(path) = &config.config_path {
            println!("{} {}", "Config:".bright_cyan(), path.display());
        }
        println!("{} {}", "Modules:".bright_cyan(), config.swap.modules_account);
        println!("{} {}", "Slippage:".bright_cyan(), config.swap.slippage);
    }

    match cli.command {
        Commands::Rate { from, to, amount } => {
            swap::show_rate(&config, from, to, amount).await?;
        }
        Commands::Swap { from, to, amount, min_out } => {
            swap::execute_swap(&config, from, to, amount, min_out).await?;
        }
        Commands::Balance { symbol } => {
            swap::show_balances(&config, symbol).await?;
        }
        Commands::Register { symbol } => {
            swap::register_token(&config, symbol).await?;
        }
        Commands::Tokens => {
            swap::list_tokens(&config);
        }
    }

    Ok(())
}
