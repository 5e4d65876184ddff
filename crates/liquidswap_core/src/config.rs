//! Protocol constants and the immutable client configuration

use amm_model::{DEFAULT_FEE, FEE_SCALE};
use serde::Deserialize;

use crate::error::SwapError;
use crate::tokens::TokenRegistry;
use crate::types::{AccountAddress, CoinType};

/// Account that publishes the Liquidswap modules
pub const MODULES_ACCOUNT: &str =
    "0x190d44266241744264b964a37b8f09863167a12d3e70cda39376cfb4e3561e12";

/// Resource account holding every Liquidswap pool
pub const RESOURCES_ACCOUNT: &str =
    "0x05a97986a9d031c4567e15b797be516910cfcb4156312482efc6a19c0a30c948";

pub const COIN_INFO: &str = "0x1::coin::CoinInfo";
pub const COIN_STORE: &str = "0x1::coin::CoinStore";
pub const REGISTER_FUNCTION: &str = "0x1::managed_coin::register";
pub const NATIVE_COIN: &str = "0x1::aptos_coin::AptosCoin";

fn default_modules_account() -> AccountAddress {
    AccountAddress::from_trusted(MODULES_ACCOUNT)
}

fn default_resources_account() -> AccountAddress {
    AccountAddress::from_trusted(RESOURCES_ACCOUNT)
}

fn default_fee_numerator() -> u64 {
    DEFAULT_FEE
}

fn default_fee_denominator() -> u64 {
    FEE_SCALE
}

fn default_slippage() -> f64 {
    0.05
}

/// Everything the swap client needs to know about the protocol and tokens
///
/// Built once (usually deserialised from the CLI's TOML file) and handed to
/// [`crate::SwapClient::new`] by value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwapConfig {
    #[serde(default = "default_modules_account")]
    pub modules_account: AccountAddress,

    #[serde(default = "default_resources_account")]
    pub resources_account: AccountAddress,

    /// Curve type argument; defaults to `<modules>::curves::Uncorrelated`
    #[serde(default)]
    pub curve: Option<String>,

    /// Used when a pool resource does not report its own fee
    #[serde(default = "default_fee_numerator")]
    pub fee_numerator: u64,

    #[serde(default = "default_fee_denominator")]
    pub fee_denominator: u64,

    /// Fraction subtracted from a quote to form the minimum output (0.05 = 5%)
    #[serde(default = "default_slippage")]
    pub slippage: f64,

    #[serde(default)]
    pub tokens: TokenRegistry,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            modules_account: default_modules_account(),
            resources_account: default_resources_account(),
            curve: None,
            fee_numerator: default_fee_numerator(),
            fee_denominator: default_fee_denominator(),
            slippage: default_slippage(),
            tokens: TokenRegistry::default(),
        }
    }
}

impl SwapConfig {
    pub fn with_tokens(tokens: TokenRegistry) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SwapError> {
        if !(0.0..1.0).contains(&self.slippage) {
            return Err(SwapError::Config(format!(
                "slippage must be in [0, 1), got {}",
                self.slippage
            )));
        }
        if self.fee_denominator == 0 || self.fee_numerator >= self.fee_denominator {
            return Err(SwapError::InvalidFee);
        }
        self.curve_type().parse::<CoinType>()?;
        Ok(())
    }

    pub fn curve_type(&self) -> String {
        match &self.curve {
            Some(curve) => curve.clone(),
            None => format!("{}::curves::Uncorrelated", self.modules_account),
        }
    }

    /// `LiquidityPool<X, Y, Curve>` for the given slot order
    pub fn pool_type(&self, x: &CoinType, y: &CoinType) -> String {
        format!(
            "{}::liquidity_pool::LiquidityPool<{}, {}, {}>",
            self.modules_account,
            x,
            y,
            self.curve_type()
        )
    }

    pub fn swap_function(&self) -> String {
        format!("{}::scripts_v2::swap", self.modules_account)
    }

    /// Minimum acceptable output for a quote under the configured tolerance
    pub fn min_amount_out(&self, quoted: f64) -> f64 {
        quoted * (1.0 - self.slippage)
    }
}

pub fn coin_info_type(coin: &CoinType) -> String {
    format!("{COIN_INFO}<{coin}>")
}

pub fn coin_store_type(coin: &CoinType) -> String {
    format!("{COIN_STORE}<{coin}>")
}
