/// Input validation for values crossing into the engine
///
/// Prices, amounts and identifiers come from the UI, the price poller and
/// the wallet. Anything invalid is rejected here, before it can reach a
/// quantity computation or a contract call.
use crate::error::{Result, ThetixError};
use rust_decimal::Decimal;

/// Validate a USD quote (must be strictly positive)
///
/// # Arguments
/// * `price` - Quote to validate
/// * `asset` - Ticker or label for error messages
pub fn validate_price(price: Decimal, asset: &str) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(ThetixError::InvalidPrice {
            asset: asset.to_string(),
            price,
        });
    }

    Ok(())
}

/// Validate the USD amount of an intent (zero is allowed, negative is not)
pub fn validate_usd_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(ThetixError::InvalidAmount(format!(
            "USD amount cannot be negative: {}",
            amount
        )));
    }

    Ok(())
}

/// Validate a held balance
pub fn validate_balance(balance: Decimal, asset: &str) -> Result<()> {
    if balance < Decimal::ZERO {
        return Err(ThetixError::InvalidAmount(format!(
            "{} balance cannot be negative: {}",
            asset, balance
        )));
    }

    Ok(())
}

/// Validate a transaction id as returned by the wallet
pub fn validate_tx_id(tx_id: &str) -> Result<()> {
    if tx_id.trim().is_empty() {
        return Err(ThetixError::Validation(
            "Transaction ID cannot be empty".to_string(),
        ));
    }

    let hex_part = tx_id.strip_prefix("0x").unwrap_or(tx_id);
    if hex_part.is_empty() || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ThetixError::Validation(format!(
            "Invalid transaction ID format: {}",
            tx_id
        )));
    }

    Ok(())
}

/// Validate a Stacks standard principal (`SP...` / `ST...`, c32 alphabet)
pub fn validate_principal(address: &str) -> Result<()> {
    const C32: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

    let valid_prefix = address.starts_with("SP")
        || address.starts_with("ST")
        || address.starts_with("SM")
        || address.starts_with("SN");
    if !valid_prefix || address.len() < 28 || address.len() > 41 {
        return Err(ThetixError::Validation(format!(
            "Invalid principal: {}",
            address
        )));
    }

    if !address[1..].chars().all(|c| C32.contains(c)) {
        return Err(ThetixError::Validation(format!(
            "Invalid principal characters: {}",
            address
        )));
    }

    Ok(())
}
