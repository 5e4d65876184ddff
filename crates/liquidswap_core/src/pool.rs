//! Pool discovery and orientation
//!
//! A Liquidswap pool is stored under `LiquidityPool<X, Y, Curve>` and the
//! order of `X` and `Y` is fixed by the protocol, not by the caller. The
//! resolver probes the caller's order first, then the reverse, and hands
//! back reserves already mapped to the caller's (from, to) direction.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::config::SwapConfig;
use crate::error::{LedgerError, SwapError};
use crate::ledger::{json_u64, LedgerClient};
use crate::tokens::{Token, TokenPair};

/// Which generic slot the caller's from-token occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// From-token is `X`
    Direct,
    /// From-token is `Y`
    Reversed,
}

/// Reserves read for one quote; never reused across calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub reserve_x: u64,
    pub reserve_y: u64,
    /// Pool fee over [`amm_model::FEE_SCALE`], when the resource reports one
    pub fee: Option<u64>,
    pub orientation: Orientation,
}

impl PoolSnapshot {
    pub fn from_reserve(&self) -> u64 {
        match self.orientation {
            Orientation::Direct => self.reserve_x,
            Orientation::Reversed => self.reserve_y,
        }
    }

    pub fn to_reserve(&self) -> u64 {
        match self.orientation {
            Orientation::Direct => self.reserve_y,
            Orientation::Reversed => self.reserve_x,
        }
    }

    fn from_resource(data: &Value, orientation: Orientation) -> Result<Self, LedgerError> {
        let reserve = |pointer: &str| {
            json_u64(data, pointer)
                .ok_or_else(|| LedgerError::Decode(format!("LiquidityPool missing {pointer}")))
        };
        Ok(Self {
            reserve_x: reserve("/coin_x_reserve/value")?,
            reserve_y: reserve("/coin_y_reserve/value")?,
            fee: json_u64(data, "/fee"),
            orientation,
        })
    }
}

/// Result of probing both slot orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolLookup {
    Found(PoolSnapshot),
    NotFound,
}

pub struct PoolResolver {
    ledger: Arc<dyn LedgerClient>,
    config: Arc<SwapConfig>,
}

impl PoolResolver {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: Arc<SwapConfig>) -> Self {
        Self { ledger, config }
    }

    /// Probe `(from, to)` then `(to, from)`
    ///
    /// Absence under one order is an expected outcome, so it is a value here;
    /// only transport and decode failures are errors.
    pub async fn lookup(&self, pair: &TokenPair) -> Result<PoolLookup, SwapError> {
        for orientation in [Orientation::Direct, Orientation::Reversed] {
            let (x, y) = match orientation {
                Orientation::Direct => (pair.from(), pair.to()),
                Orientation::Reversed => (pair.to(), pair.from()),
            };
            let pool_type = self.config.pool_type(x.coin_type(), y.coin_type());
            debug!("probing {pool_type}");

            let resource = self
                .ledger
                .read_resource(&self.config.resources_account, &pool_type)
                .await?;
            if let Some(data) = resource {
                let snapshot = PoolSnapshot::from_resource(&data, orientation)?;
                debug!(
                    "{} pool found ({:?}): x={} y={}",
                    pair, orientation, snapshot.reserve_x, snapshot.reserve_y
                );
                return Ok(PoolLookup::Found(snapshot));
            }
        }
        Ok(PoolLookup::NotFound)
    }

    /// Oriented reserves for trading `from` into `to`
    pub async fn resolve(&self, from: &Token, to: &Token) -> Result<PoolSnapshot, SwapError> {
        let pair = TokenPair::new(from.clone(), to.clone())?;
        match self.lookup(&pair).await? {
            PoolLookup::Found(snapshot) => Ok(snapshot),
            PoolLookup::NotFound => Err(SwapError::PoolNotFound {
                from: from.symbol().to_string(),
                to: to.symbol().to_string(),
            }),
        }
    }
}
