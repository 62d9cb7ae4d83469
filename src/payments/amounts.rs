//! Decimal to atomic-unit conversion
//!
//! Atomic amounts are what providers execute against, so the conversion must
//! be exact: the decimal string is parsed with `rust_decimal` and scaled with
//! 256-bit integer arithmetic. Floating point never touches the value.

use std::str::FromStr;

use ethereum_types::U256;
use rust_decimal::Decimal;

use crate::error::GatewayError;

/// Largest exponent 10^n representable in a U256.
const MAX_DECIMALS: u32 = 77;

/// Converts a decimal amount string to atomic units: floor(amount * 10^decimals).
///
/// Digits beyond `decimals` places are truncated toward zero. The result is
/// returned as a decimal string, ready to be sent to a provider verbatim.
///
/// # Arguments
///
/// * `amount` - Decimal amount string, e.g. "100.00"
/// * `decimals` - Decimal precision of the target asset
///
/// # Returns
///
/// * `Ok(String)` - Atomic amount, e.g. "100000000" for ("100.00", 6)
/// * `Err(GatewayError::InvalidAmount)` - Unparseable, non-positive, or
///   out-of-range input
pub fn to_atomic_units(amount: &str, decimals: u32) -> Result<String, GatewayError> {
    let invalid = |reason: &str| GatewayError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.to_string(),
    };

    if decimals > MAX_DECIMALS {
        return Err(invalid("decimal precision out of range"));
    }

    let parsed = Decimal::from_str(amount.trim())
        .map_err(|_| invalid("not a decimal number"))?;

    if parsed.is_sign_negative() || parsed.is_zero() {
        return Err(invalid("amount must be positive"));
    }

    // Truncate (floor, since the value is positive) to the asset precision,
    // then scale the integer mantissa up to exactly `decimals` places.
    let truncated = parsed.trunc_with_scale(decimals);
    if truncated.is_zero() {
        return Err(invalid("amount is below the asset's atomic precision"));
    }

    let mantissa = U256::from(truncated.mantissa().unsigned_abs());
    let exponent = decimals - truncated.scale();
    let scaled = U256::from(10u64)
        .checked_pow(U256::from(exponent))
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| invalid("amount too large"))?;

    Ok(scaled.to_string())
}
