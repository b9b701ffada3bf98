//! # Fixed-Point Amount Arithmetic
//!
//! Token amounts cross the wire and the store as decimal strings so that
//! precision is never lost to floating point. Tally maintenance needs exact
//! addition and comparison over those strings.

use crate::errors::AmountError;

/// Parse a fixed-point amount string into its integer value.
///
/// Accepts optional surrounding whitespace; rejects empty strings, signs,
/// and non-digit characters.
pub fn parse(amount: &str) -> Result<u128, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    trimmed
        .parse::<u128>()
        .map_err(|_| AmountError::NotANumber(amount.to_string()))
}

/// Add two amount strings, returning the canonical sum string.
pub fn add(a: &str, b: &str) -> Result<String, AmountError> {
    let sum = parse(a)?
        .checked_add(parse(b)?)
        .ok_or(AmountError::Overflow)?;
    Ok(sum.to_string())
}

/// True when `a` represents a strictly smaller amount than `b`.
pub fn less_than(a: &str, b: &str) -> Result<bool, AmountError> {
    Ok(parse(a)? < parse(b)?)
}

/// The zero amount in canonical form.
#[must_use]
pub fn zero() -> String {
    "0".to_string()
}
