//! Decimal conversion driven by on-chain `CoinInfo` metadata

use std::collections::HashMap;
use std::sync::Arc;

use amm_model::MAX_DECIMALS;
use log::debug;
use tokio::sync::RwLock;

use crate::config::coin_info_type;
use crate::error::SwapError;
use crate::ledger::{json_u64, LedgerClient};
use crate::tokens::Token;
use crate::types::CoinType;

/// Converts between human amounts and base units for configured tokens
///
/// Precision is cached per coin type for the lifetime of the converter; a
/// coin's `decimals` never changes after publication. The cache lock is never
/// held while reading from the ledger.
pub struct DecimalConverter {
    ledger: Arc<dyn LedgerClient>,
    cache: RwLock<HashMap<CoinType, u8>>,
}

impl DecimalConverter {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn decimals(&self, token: &Token) -> Result<u8, SwapError> {
        let coin = token.coin_type();
        if let Some(decimals) = self.cache.read().await.get(coin) {
            return Ok(*decimals);
        }

        // No lock across the read; a racing duplicate fetch yields the same value
        let decimals = self.fetch_decimals(coin).await?;
        debug!("{} ({}) has {} decimals", token.symbol(), coin, decimals);
        let mut cache = self.cache.write().await;
        Ok(*cache.entry(coin.clone()).or_insert(decimals))
    }

    async fn fetch_decimals(&self, coin: &CoinType) -> Result<u8, SwapError> {
        let unavailable = |reason: String| SwapError::MetadataUnavailable {
            coin: coin.to_string(),
            reason,
        };

        let data = self
            .ledger
            .read_resource(coin.address(), &coin_info_type(coin))
            .await
            .map_err(|e| unavailable(e.to_string()))?
            .ok_or_else(|| unavailable("CoinInfo resource not found".into()))?;

        let decimals = json_u64(&data, "/decimals")
            .ok_or_else(|| unavailable("CoinInfo has no numeric `decimals`".into()))?;
        match u8::try_from(decimals) {
            Ok(d) if d <= MAX_DECIMALS => Ok(d),
            _ => Err(unavailable(format!("unsupported precision {decimals}"))),
        }
    }

    /// Human amount -> base units, truncating sub-unit dust
    pub async fn to_base_units(&self, amount: f64, token: &Token) -> Result<u64, SwapError> {
        let decimals = self.decimals(token).await?;
        amm_model::to_base_units(amount, decimals).map_err(|e| {
            SwapError::InvalidAmount(format!("{} {}: {}", amount, token.symbol(), e))
        })
    }

    pub async fn to_decimal(&self, raw: u64, token: &Token) -> Result<f64, SwapError> {
        let decimals = self.decimals(token).await?;
        Ok(amm_model::to_decimal(raw, decimals))
    }
}
