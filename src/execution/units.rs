//! Fixed-point helpers for on-chain quantities.
//!
//! Contract arguments are integer base units (`amount * 10^decimals`). The
//! conversion always floors so a request never asks for more than the user
//! authorized.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::MAX_DECIMALS;
use crate::error::{Result, ThetixError};

/// `10^decimals` as a Decimal
pub fn scale_factor(decimals: u32) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(ThetixError::InvalidQuantity(format!(
            "{} decimals exceeds maximum {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(Decimal::from(10u64.pow(decimals)))
}

/// Division that never produces a non-finite value
pub fn checked_div(numerator: Decimal, denominator: Decimal, what: &str) -> Result<Decimal> {
    if denominator.is_zero() {
        return Err(ThetixError::DivisionByZero(what.to_string()));
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| ThetixError::InvalidAmount(format!("{} overflows", what)))
}

/// Multiplication that reports overflow instead of panicking
pub fn checked_mul(lhs: Decimal, rhs: Decimal, what: &str) -> Result<Decimal> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| ThetixError::InvalidAmount(format!("{} overflows", what)))
}

/// `floor(amount * 10^decimals)`
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u128> {
    if amount < Decimal::ZERO {
        return Err(ThetixError::InvalidQuantity(format!(
            "quantity cannot be negative: {}",
            amount
        )));
    }
    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or_else(|| ThetixError::InvalidQuantity(format!("{} overflows base units", amount)))?;

    scaled
        .floor()
        .to_u128()
        .ok_or_else(|| ThetixError::InvalidQuantity(format!("{} overflows base units", amount)))
}

/// Human-unit value of `units` base units
pub fn from_base_units(units: u128, decimals: u32) -> Result<Decimal> {
    let units = i128::try_from(units)
        .map_err(|_| ThetixError::InvalidQuantity(format!("{} base units too large", units)))?;
    Decimal::try_from_i128_with_scale(units, decimals)
        .map_err(|e| ThetixError::InvalidQuantity(format!("{} base units: {}", units, e)))
}
