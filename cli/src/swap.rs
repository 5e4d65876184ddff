//! Quote, swap, balance and registration commands

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use liquidswap_core::{AccountAddress, Signer, SwapClient, SwapRequest};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{format_address, format_hash, AptosRestClient};
use crate::config::{load_wallet, NetworkConfig};
use crate::signer::{ReadOnlySigner, WalletSigner};

/// Build a swap client for the configured wallet and node
pub fn connect(config: &NetworkConfig) -> Result<SwapClient> {
    let (address, keypair) = load_wallet(&config.wallet_path)?;
    client_with(config, Arc::new(WalletSigner::new(address, keypair)))
}

/// Build a client that can quote but never sign; no wallet file is read
pub fn connect_read_only(config: &NetworkConfig) -> Result<SwapClient> {
    let placeholder: AccountAddress = "0x0".parse()?;
    client_with(config, Arc::new(ReadOnlySigner::new(placeholder)))
}

fn client_with(config: &NetworkConfig, signer: Arc<dyn Signer>) -> Result<SwapClient> {
    let ledger = AptosRestClient::from_config(config).context("Failed to create REST client")?;
    SwapClient::new(config.swap.clone(), Arc::new(ledger), signer)
        .context("Failed to create swap client")
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}

pub async fn show_rate(
    config: &NetworkConfig,
    from: String,
    to: String,
    amount: f64,
) -> Result<()> {
    let client = connect_read_only(config)?;

    println!("{}", "=== Quote ===".bright_green().bold());
    let quote = client
        .quote(&from, &to, amount)
        .await
        .with_context(|| format!("Failed to quote {} {} -> {}", amount, from, to))?;

    println!("{} {} {}", "Sell:".bright_cyan(), quote.amount_in, quote.from_token);
    println!("{} {} {}", "Receive:".bright_cyan(), quote.amount_out, quote.to_token);
    println!(
        "{} 1 {} = {} {}",
        "Rate:".bright_cyan(),
        quote.from_token,
        quote.amount_out / quote.amount_in,
        quote.to_token
    );
    let min = config.swap.min_amount_out(quote.amount_out);
    println!(
        "{} {} {} ({}% slippage)",
        "Minimum:".bright_cyan(),
        min,
        quote.to_token,
        config.swap.slippage * 100.0
    );
    Ok(())
}

pub async fn execute_swap(
    config: &NetworkConfig,
    from: String,
    to: String,
    amount: f64,
    min_out: Option<f64>,
) -> Result<()> {
    let client = connect(config)?;

    println!("{}", "=== Swap ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), format_address(client.address()));

    let quote = client
        .quote(&from, &to, amount)
        .await
        .with_context(|| format!("Failed to quote {} {} -> {}", amount, from, to))?;
    let min_out = min_out.unwrap_or_else(|| config.swap.min_amount_out(quote.amount_out));

    println!("{} {} {}", "Sell:".bright_cyan(), amount, quote.from_token);
    println!("{} {} {}", "Expected:".bright_cyan(), quote.amount_out, quote.to_token);
    println!("{} {} {}", "Minimum:".bright_cyan(), min_out, quote.to_token);

    let request = SwapRequest::new(&from, &to, amount, min_out).with_expected_out(quote.amount_out);

    let bar = spinner("Swapping...")?;
    let result = client.swap(&request).await;
    bar.finish_and_clear();

    match result {
        Ok(hash) => {
            println!(
                "{} {}",
                "Swap confirmed:".bright_green(),
                format_hash(&hash, &config.network)
            );
            Ok(())
        }
        Err(failure) => {
            if failure.error.is_slippage_violation() {
                println!(
                    "{}",
                    "Price moved past the minimum output; nothing was swapped".yellow()
                );
            } else if failure.may_have_executed() {
                println!(
                    "{}",
                    "The swap may still execute; check the account before retrying".yellow()
                );
            }
            Err(failure.into())
        }
    }
}

pub async fn show_balances(config: &NetworkConfig, symbol: Option<String>) -> Result<()> {
    let client = connect(config)?;

    println!("{}", "=== Balances ===".bright_green().bold());
    println!("{} {}", "Account:".bright_cyan(), format_address(client.address()));

    if let Some(symbol) = symbol {
        let balance = client
            .get_token_balance(&symbol)
            .await
            .with_context(|| format!("Failed to read {} balance", symbol))?;
        println!("{} {}", format!("{}:", symbol).bright_cyan(), balance);
        return Ok(());
    }

    let native = client.native_balance().await.context("Failed to read APT balance")?;
    println!("{} {}", "APT (gas):".bright_cyan(), native);

    for token in client.tokens().iter() {
        let balance = client
            .get_token_balance(token.symbol())
            .await
            .with_context(|| format!("Failed to read {} balance", token))?;
        let line = format!("{}: {}", token, balance);
        if balance == 0.0 {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

pub async fn register_token(config: &NetworkConfig, symbol: String) -> Result<()> {
    let client = connect(config)?;

    println!("{}", "=== Register Coin ===".bright_green().bold());
    println!("{} {}", "Token:".bright_cyan(), symbol);

    if client.is_registered(&symbol).await? {
        println!("{}", "Already registered".dimmed());
        return Ok(());
    }

    let bar = spinner("Registering...")?;
    let result = client.register(&symbol).await;
    bar.finish_and_clear();

    let hash = result.with_context(|| format!("Failed to register {}", symbol))?;
    println!("{} {}", "Registered:".bright_green(), format_hash(&hash, &config.network));
    Ok(())
}

pub fn list_tokens(config: &NetworkConfig) {
    println!("{}", "=== Tokens ===".bright_green().bold());
    for token in config.swap.tokens.iter() {
        println!("{:<8} {}", token.symbol().bright_cyan(), token.coin_type());
    }
}
