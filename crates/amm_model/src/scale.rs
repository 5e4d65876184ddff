//! Fixed-point conversion between human decimals and on-chain base units

use crate::{AmmError, MAX_DECIMALS};

fn factor(decimals: u8) -> f64 {
    10f64.powi(i32::from(decimals.min(MAX_DECIMALS)))
}

/// Scale a human amount up to integer base units, truncating toward zero
///
/// Fractional base units cannot exist on-chain, so anything below one unit
/// of the least-significant digit is dropped.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<u64, AmmError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AmmError::InvalidAmount);
    }
    let scaled = (amount * factor(decimals)).trunc();
    if scaled >= u64::MAX as f64 {
        return Err(AmmError::Overflow);
    }
    Ok(scaled as u64)
}

/// Scale integer base units down to a human amount
pub fn to_decimal(raw: u64, decimals: u8) -> f64 {
    raw as f64 / factor(decimals)
}
