//! Order Calculator
//!
//! Turns a USD intent into on-chain quantities.
//!
//! # Formulas
//! - `settlement_amount = usd_amount / reference_price`
//! - `raw_asset_amount  = usd_amount / asset.price`
//! - Buy:  fee on the settlement sent, user receives `raw - raw * fee_rate`
//! - Sell: quantity is `min(balance, raw)`, fee on the settlement value of
//!   that quantity
//!
//! Every on-chain quantity is `floor(amount * 10^decimals)`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::units::{checked_div, checked_mul, to_base_units};
use crate::config::TradeConfig;
use crate::domain::{Asset, TradeDirection, TradeIntent, TradeQuantities};
use crate::error::{Result, ThetixError};
use crate::validation::{validate_balance, validate_price, validate_usd_amount};

/// Quantities for display, zeroed when they could not be computed.
///
/// The error is always carried along: zeroing only keeps NaN-like values off
/// the screen, it does not make the trade valid.
#[derive(Debug)]
pub struct QuotePreview {
    pub quantities: TradeQuantities,
    pub error: Option<ThetixError>,
}

impl QuotePreview {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<TradeQuantities> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.quantities),
        }
    }
}

/// Fee and precision parameters for quantity computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCalculator {
    /// Flat trading fee (0.001 = 0.1%)
    fee_rate: Decimal,
    /// Base-unit precision of the settlement asset
    settlement_decimals: u32,
    /// Fixed tolerance on expected Sell proceeds
    slippage_tolerance: Decimal,
}

impl Default for OrderCalculator {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.001),
            settlement_decimals: 8,
            slippage_tolerance: Decimal::ZERO,
        }
    }
}

impl OrderCalculator {
    pub fn new(fee_rate: Decimal, settlement_decimals: u32) -> Self {
        Self {
            fee_rate,
            settlement_decimals,
            slippage_tolerance: Decimal::ZERO,
        }
    }

    pub fn with_slippage_tolerance(mut self, tolerance: Decimal) -> Self {
        self.slippage_tolerance = tolerance;
        self
    }

    pub fn from_config(config: &TradeConfig) -> Self {
        Self::new(config.fee_rate, config.settlement_decimals)
            .with_slippage_tolerance(config.slippage_tolerance)
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    pub fn settlement_decimals(&self) -> u32 {
        self.settlement_decimals
    }

    /// Compute validated quantities for `intent`.
    ///
    /// `balance` is the held amount of the traded asset and only matters for
    /// Sell. Identical inputs always give identical outputs.
    pub fn compute_trade(
        &self,
        intent: &TradeIntent,
        reference_price: Decimal,
        balance: Decimal,
    ) -> Result<TradeQuantities> {
        let asset = &intent.asset;

        validate_usd_amount(intent.usd_amount)?;
        validate_price(reference_price, "reference asset")?;
        validate_price(asset.price, &asset.ticker)?;

        let settlement_amount =
            checked_div(intent.usd_amount, reference_price, "settlement amount")?;
        let raw_asset_amount = checked_div(intent.usd_amount, asset.price, "asset amount")?;

        let quantities = match intent.direction {
            TradeDirection::Buy => self.buy_quantities(settlement_amount, raw_asset_amount)?,
            TradeDirection::Sell => self.sell_quantities(
                asset,
                reference_price,
                balance,
                settlement_amount,
                raw_asset_amount,
            )?,
        };

        debug!(
            direction = %intent.direction,
            ticker = %asset.ticker,
            usd = %intent.usd_amount,
            settlement = %quantities.settlement_amount,
            asset_amount = %quantities.display_amount,
            base_units = quantities.transfer_base_units,
            "computed trade quantities"
        );

        Ok(quantities)
    }

    /// Same as [`compute_trade`](Self::compute_trade) but never fails: on error
    /// the quantities are zero and the error is returned alongside.
    pub fn preview(
        &self,
        intent: &TradeIntent,
        reference_price: Decimal,
        balance: Decimal,
    ) -> QuotePreview {
        match self.compute_trade(intent, reference_price, balance) {
            Ok(quantities) => QuotePreview {
                quantities,
                error: None,
            },
            Err(err) => {
                debug!(ticker = %intent.asset.ticker, error = %err, "quote unavailable");
                QuotePreview {
                    quantities: TradeQuantities::zero(intent.direction),
                    error: Some(err),
                }
            }
        }
    }

    /// Largest USD amount offered by the "Max" helper.
    ///
    /// Buy spends `max_buy_fraction` of the settlement balance; Sell offers the
    /// whole asset balance. Unknown prices give zero, overflow gives `InvalidAmount`.
    pub fn max_usd_amount(
        &self,
        direction: TradeDirection,
        asset: &Asset,
        reference_price: Decimal,
        settlement_balance: Decimal,
        asset_balance: Decimal,
        max_buy_fraction: Decimal,
    ) -> Result<Decimal> {
        match direction {
            TradeDirection::Buy if reference_price > Decimal::ZERO => {
                let value = checked_mul(
                    settlement_balance.max(Decimal::ZERO),
                    reference_price,
                    "settlement balance value",
                )?;
                checked_mul(value, max_buy_fraction, "max buy amount")
            }
            TradeDirection::Sell => asset
                .usd_value(asset_balance.max(Decimal::ZERO))
                .ok_or_else(|| {
                    ThetixError::InvalidAmount(format!(
                        "{} balance value overflows: {} at {}",
                        asset.ticker, asset_balance, asset.price
                    ))
                }),
            _ => Ok(Decimal::ZERO),
        }
    }

    fn buy_quantities(
        &self,
        settlement_amount: Decimal,
        raw_asset_amount: Decimal,
    ) -> Result<TradeQuantities> {
        let fee_amount = checked_mul(settlement_amount, self.fee_rate, "fee")?;
        let asset_fee_amount = checked_mul(raw_asset_amount, self.fee_rate, "asset fee")?;
        let net_transfer_amount = settlement_amount - fee_amount;

        let transfer_base_units = to_base_units(settlement_amount, self.settlement_decimals)?;
        let net_transfer_base_units =
            to_base_units(net_transfer_amount, self.settlement_decimals)?;

        Ok(TradeQuantities {
            direction: TradeDirection::Buy,
            settlement_amount,
            raw_asset_amount,
            clamped_settlement_amount: settlement_amount,
            fee_amount,
            asset_fee_amount,
            display_amount: raw_asset_amount - asset_fee_amount,
            transfer_amount: settlement_amount,
            net_transfer_amount,
            transfer_base_units,
            net_transfer_base_units,
            // The buyer is the one sending sBTC; the bound is what they send.
            expected_settlement_base_units: transfer_base_units,
            clamped: false,
        })
    }

    fn sell_quantities(
        &self,
        asset: &Asset,
        reference_price: Decimal,
        balance: Decimal,
        settlement_amount: Decimal,
        raw_asset_amount: Decimal,
    ) -> Result<TradeQuantities> {
        validate_balance(balance, &asset.ticker)?;

        let clamped = raw_asset_amount > balance;
        let transfer_amount = raw_asset_amount.min(balance);
        if clamped {
            warn!(
                ticker = %asset.ticker,
                requested = %raw_asset_amount,
                balance = %balance,
                "sell amount clamped to balance"
            );
        }

        let clamped_settlement_amount = if clamped {
            let usd = checked_mul(transfer_amount, asset.price, "sell value")?;
            checked_div(usd, reference_price, "sell settlement")?
        } else {
            settlement_amount
        };

        let fee_amount = checked_mul(clamped_settlement_amount, self.fee_rate, "fee")?;
        let asset_fee_amount = checked_mul(transfer_amount, self.fee_rate, "asset fee")?;
        let net_transfer_amount = transfer_amount - asset_fee_amount;

        let transfer_base_units = to_base_units(transfer_amount, asset.decimals)?;
        let net_transfer_base_units = to_base_units(net_transfer_amount, asset.decimals)?;

        let proceeds = clamped_settlement_amount - fee_amount;
        let min_proceeds = checked_mul(
            proceeds,
            Decimal::ONE - self.slippage_tolerance,
            "expected proceeds",
        )?;
        let expected_settlement_base_units =
            to_base_units(min_proceeds.max(Decimal::ZERO), self.settlement_decimals)?;

        Ok(TradeQuantities {
            direction: TradeDirection::Sell,
            settlement_amount,
            raw_asset_amount,
            clamped_settlement_amount,
            fee_amount,
            asset_fee_amount,
            display_amount: net_transfer_amount,
            transfer_amount,
            net_transfer_amount,
            transfer_base_units,
            net_transfer_base_units,
            expected_settlement_base_units,
            clamped,
        })
    }
}
