//! Network configuration, config file and wallet loading

use anyhow::{Context, Result};
use liquidswap_core::{AccountAddress, SwapConfig, TokenRegistry};
use serde::Deserialize;
use solana_sdk::signer::keypair::{keypair_from_seed, Keypair};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "~/.config/liquidswap/config.toml";
const DEFAULT_WALLET_PATH: &str = "~/.config/liquidswap/wallet.json";

fn default_max_gas_amount() -> u64 {
    100_000
}

fn default_gas_unit_price() -> u64 {
    100
}

/// Gas settings attached to every transaction the CLI prepares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_max_gas_amount")]
    pub max_gas_amount: u64,
    #[serde(default = "default_gas_unit_price")]
    pub gas_unit_price: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: default_max_gas_amount(),
            gas_unit_price: default_gas_unit_price(),
        }
    }
}

/// Transport deadlines for the fullnode client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Whole request, connect included
    pub request: Duration,
    pub connect: Duration,
    /// How long to poll for a submitted transaction
    pub confirmation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
            connect: Duration::from_secs(5),
            confirmation: Duration::from_secs(30),
        }
    }
}

/// Contents of the TOML config file
///
/// Protocol settings (`slippage`, `[tokens]`, accounts, fee) sit at the top
/// level next to the transport settings.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub node_url: Option<String>,
    pub wallet_path: Option<String>,
    pub confirmation_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(flatten)]
    pub swap: SwapConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Testnet coins known to the Liquidswap deployment
pub fn default_tokens() -> Result<TokenRegistry> {
    TokenRegistry::from_mapping([
        ("APTOS", "0x1::aptos_coin::AptosCoin"),
        (
            "USDT",
            "0x43417434fd869edee76cca2a4d2301e528a1551b1d719b75c350c3c97d15b8b9::coins::USDT",
        ),
        (
            "BTC",
            "0x43417434fd869edee76cca2a4d2301e528a1551b1d719b75c350c3c97d15b8b9::coins::BTC",
        ),
    ])
    .context("Invalid built-in token table")
}

/// Fullnode REST endpoint for a named network
pub fn preset_url(network: &str) -> Result<&'static str> {
    let url = match network {
        "mainnet" => "https://fullnode.mainnet.aptoslabs.com/v1",
        "testnet" => "https://fullnode.testnet.aptoslabs.com/v1",
        "devnet" => "https://fullnode.devnet.aptoslabs.com/v1",
        "local" | "localnet" => "http://127.0.0.1:8080/v1",
        _ => anyhow::bail!("Unknown network: {}. Use mainnet, testnet, devnet, or local", network),
    };
    Ok(url)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

pub struct NetworkConfig {
    pub network: String,
    pub node_url: Url,
    pub wallet_path: PathBuf,
    /// Config file actually read, if any
    pub config_path: Option<PathBuf>,
    pub gas: GasConfig,
    pub timeouts: Timeouts,
    pub swap: SwapConfig,
}

impl NetworkConfig {
    /// Resolve settings; command-line values win over the config file,
    /// which wins over the network preset
    pub fn new(
        network: &str,
        node_url: Option<String>,
        wallet_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let preset = preset_url(network)?;

        let config_path = match config_path {
            Some(path) => Some(path),
            None => Some(expand(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let node_url = node_url
            .or(file.node_url)
            .unwrap_or_else(|| preset.to_string());
        let node_url = Url::parse(&node_url)
            .with_context(|| format!("Invalid node URL: {}", node_url))?;

        let wallet_path = match wallet_path {
            Some(path) => path,
            None => expand(file.wallet_path.as_deref().unwrap_or(DEFAULT_WALLET_PATH)),
        };

        let mut swap = file.swap;
        if swap.tokens.is_empty() {
            swap.tokens = default_tokens()?;
        }
        swap.validate().context("Invalid swap configuration")?;

        let defaults = Timeouts::default();
        let secs = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_secs).unwrap_or(default)
        };
        let timeouts = Timeouts {
            request: secs(file.request_timeout_secs, defaults.request),
            connect: secs(file.connect_timeout_secs, defaults.connect),
            confirmation: secs(file.confirmation_timeout_secs, defaults.confirmation),
        };
        if timeouts.request.is_zero() || timeouts.connect.is_zero() {
            anyhow::bail!("Request and connect timeouts must be at least one second");
        }

        Ok(Self {
            network: network.to_string(),
            node_url,
            wallet_path,
            config_path,
            gas: file.gas,
            timeouts,
            swap,
        })
    }
}

/// Wallet file: `{ "account_address": "0x..", "private_key": "0x.." }`
#[derive(Debug, Deserialize)]
struct WalletFile {
    account_address: String,
    private_key: String,
}

/// Load the account address and its Ed25519 key from a wallet file
pub fn load_wallet(path: &Path) -> Result<(AccountAddress, Keypair)> {
    if !path.exists() {
        anyhow::bail!(
            "Wallet file not found: {}\n\
             Export one with: aptos account export or pass --wallet",
            path.display()
        );
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read wallet file: {}", path.display()))?;
    let wallet: WalletFile = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse wallet JSON: {}", path.display()))?;

    let address: AccountAddress = wallet
        .account_address
        .parse()
        .with_context(|| format!("Invalid account address in: {}", path.display()))?;

    let key_hex = wallet.private_key.trim_start_matches("0x");
    let seed = hex::decode(key_hex)
        .with_context(|| format!("Private key is not hex in: {}", path.display()))?;
    if seed.len() != 32 {
        anyhow::bail!(
            "Private key in {} must be 32 bytes, got {}",
            path.display(),
            seed.len()
        );
    }
    let keypair = keypair_from_seed(&seed)
        .map_err(|e| anyhow::anyhow!("Invalid private key in {}: {}", path.display(), e))?;

    Ok((address, keypair))
}
