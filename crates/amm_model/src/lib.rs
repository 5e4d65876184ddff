//! AMM Model - Pure constant product math (x·y=k) for client-side quoting
//!
//! This crate contains the Liquidswap uncorrelated-curve output formula and
//! the base-unit scaling used when building swap payloads. Nothing here
//! performs I/O: callers fetch reserves and coin precision from the ledger
//! and pass plain numbers in.

pub mod math;
pub mod scale;

pub use math::{quote_out, quote_out_no_fee};
pub use scale::{to_base_units, to_decimal};

/// Fee scale used by Liquidswap pools (10,000 = 100%)
pub const FEE_SCALE: u64 = 10_000;

/// Default uncorrelated-curve fee (30 / 10,000 = 0.3%)
pub const DEFAULT_FEE: u64 = 30;

/// Largest decimal precision a coin may declare
pub const MAX_DECIMALS: u8 = 19;

/// Error types for AMM operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmError {
    /// Invalid reserves (zero, negative or not finite)
    InvalidReserves,
    /// Invalid amount (zero, negative or not finite)
    InvalidAmount,
    /// Fee numerator not strictly below a non-zero denominator
    InvalidFee,
    /// Value does not fit the on-chain integer width
    Overflow,
}

impl core::fmt::Display for AmmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AmmError::InvalidReserves => write!(f, "reserves must be positive"),
            AmmError::InvalidAmount => write!(f, "amount must be positive"),
            AmmError::InvalidFee => write!(f, "fee numerator must be below the fee denominator"),
            AmmError::Overflow => write!(f, "amount exceeds u64 base units"),
        }
    }
}

impl std::error::Error for AmmError {}
