//! Constant product AMM math (x·y=k) with the fee taken from the input

use crate::AmmError;

/// Calculate the output amount for selling `amount_in` of the from-coin
///
/// With fee on input (scaled so the fee never needs a fractional step):
/// - Δin_net = Δin · (D - N)
/// - from1 = from0 · D + Δin_net
/// - Δout = Δin_net · to0 / from1
///
/// This is `x·y = k` solved for the output side with the fee deducted up
/// front. All values are human-scale decimals; the result is in the same
/// unit as `to_reserve`.
///
/// # Arguments
/// * `amount_in` - Amount of the from-coin being sold
/// * `from_reserve` - Pool reserve of the from-coin
/// * `to_reserve` - Pool reserve of the to-coin
/// * `fee_numerator` - Fee numerator (e.g., 30)
/// * `fee_denominator` - Fee denominator (e.g., 10,000)
///
/// # Returns
/// * Output amount, always strictly below `to_reserve`
/// * `AmmError` if reserves, amount or fee are invalid
pub fn quote_out(
    amount_in: f64,
    from_reserve: f64,
    to_reserve: f64,
    fee_numerator: u64,
    fee_denominator: u64,
) -> Result<f64, AmmError> {
    // Validate inputs
    if !(from_reserve.is_finite() && to_reserve.is_finite())
        || from_reserve <= 0.0
        || to_reserve <= 0.0
    {
        return Err(AmmError::InvalidReserves);
    }
    if !amount_in.is_finite() || amount_in <= 0.0 {
        return Err(AmmError::InvalidAmount);
    }
    if fee_denominator == 0 || fee_numerator >= fee_denominator {
        return Err(AmmError::InvalidFee);
    }

    let scale = fee_denominator as f64;
    let amount_in_after_fee = amount_in * (fee_denominator - fee_numerator) as f64;
    let new_from_reserve = from_reserve * scale + amount_in_after_fee;

    Ok(amount_in_after_fee * to_reserve / new_from_reserve)
}

/// Exact constant-product output with no fee: `Δin·to0 / (from0 + Δin)`
pub fn quote_out_no_fee(
    amount_in: f64,
    from_reserve: f64,
    to_reserve: f64,
) -> Result<f64, AmmError> {
    quote_out(amount_in, from_reserve, to_reserve, 0, 1)
}
