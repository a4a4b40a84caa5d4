use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Asset, AssetKey, TradeDirection, TradeStatus};
use crate::error::{Result, ThetixError};

/// What the user asked for: spend (or receive) `usd_amount` worth of `asset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub direction: TradeDirection,
    pub asset: Asset,
    pub usd_amount: Decimal,
}

impl TradeIntent {
    pub fn new(direction: TradeDirection, asset: Asset, usd_amount: Decimal) -> Self {
        Self {
            direction,
            asset,
            usd_amount,
        }
    }

    pub fn buy(asset: Asset, usd_amount: Decimal) -> Self {
        Self::new(TradeDirection::Buy, asset, usd_amount)
    }

    pub fn sell(asset: Asset, usd_amount: Decimal) -> Self {
        Self::new(TradeDirection::Sell, asset, usd_amount)
    }

    /// Build an intent from a raw form value.
    ///
    /// NaN, infinities and negative numbers never make it into an intent.
    pub fn from_f64(direction: TradeDirection, asset: Asset, usd_amount: f64) -> Result<Self> {
        Ok(Self::new(direction, asset, usd_amount_from_f64(usd_amount)?))
    }
}

/// Convert a form value into a USD amount
pub fn usd_amount_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(ThetixError::InvalidAmount(format!(
            "USD amount must be finite: {}",
            value
        )));
    }
    if value < 0.0 {
        return Err(ThetixError::InvalidAmount(format!(
            "USD amount cannot be negative: {}",
            value
        )));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        ThetixError::InvalidAmount(format!("USD amount out of range: {}", value))
    })
}

/// Quantities derived from an intent, a reference price and a balance.
///
/// Never stored; recompute whenever the intent, a price or the balance changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuantities {
    pub direction: TradeDirection,
    /// `usd_amount / reference_price`
    pub settlement_amount: Decimal,
    /// `usd_amount / asset.price`, before any clamp or fee
    pub raw_asset_amount: Decimal,
    /// Settlement value of the quantity actually traded (equals
    /// `settlement_amount` unless a Sell was clamped)
    pub clamped_settlement_amount: Decimal,
    /// Fee in settlement units
    pub fee_amount: Decimal,
    /// Fee in asset units
    pub asset_fee_amount: Decimal,
    /// Asset amount net of fee, as shown to the user
    pub display_amount: Decimal,
    /// Gross quantity moved on-chain, in human units of the transferred asset
    pub transfer_amount: Decimal,
    /// `transfer_amount` with the fee netted out
    pub net_transfer_amount: Decimal,
    pub transfer_base_units: u128,
    pub net_transfer_base_units: u128,
    /// Settlement base units the post-condition asserts
    pub expected_settlement_base_units: u128,
    /// True when the Sell guard reduced the quantity to the held balance
    pub clamped: bool,
}

impl TradeQuantities {
    /// All-zero quantities, used when a quote cannot be computed
    pub fn zero(direction: TradeDirection) -> Self {
        Self {
            direction,
            settlement_amount: Decimal::ZERO,
            raw_asset_amount: Decimal::ZERO,
            clamped_settlement_amount: Decimal::ZERO,
            fee_amount: Decimal::ZERO,
            asset_fee_amount: Decimal::ZERO,
            display_amount: Decimal::ZERO,
            transfer_amount: Decimal::ZERO,
            net_transfer_amount: Decimal::ZERO,
            transfer_base_units: 0,
            net_transfer_base_units: 0,
            expected_settlement_base_units: 0,
            clamped: false,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.transfer_base_units == 0
    }

    /// Asset quantity recorded for the trade (gross, after the Sell clamp)
    pub fn asset_amount(&self) -> Decimal {
        match self.direction {
            TradeDirection::Buy => self.raw_asset_amount,
            TradeDirection::Sell => self.transfer_amount,
        }
    }
}

/// A submitted trade awaiting chain confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTrade {
    pub tx_id: String,
    pub status: TradeStatus,
    pub asset_key: AssetKey,
    pub direction: TradeDirection,
    pub settlement_amount: Decimal,
    pub asset_amount: Decimal,
    /// Submission time, unix seconds
    pub timestamp_seconds: i64,
    /// Last status change, unix seconds
    pub updated_at_seconds: i64,
}

impl PendingTrade {
    pub fn new(
        tx_id: impl Into<String>,
        asset_key: AssetKey,
        direction: TradeDirection,
        settlement_amount: Decimal,
        asset_amount: Decimal,
        timestamp_seconds: i64,
    ) -> Self {
        Self {
            tx_id: tx_id.into(),
            status: TradeStatus::Pending,
            asset_key,
            direction,
            settlement_amount,
            asset_amount,
            timestamp_seconds,
            updated_at_seconds: timestamp_seconds,
        }
    }

    /// Seconds since submission
    pub fn age_secs(&self) -> i64 {
        (Utc::now().timestamp() - self.timestamp_seconds).max(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Payload handed to the toast notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub tx_id: String,
    pub status: TradeStatus,
    pub asset_key: AssetKey,
    pub amount_settlement: Decimal,
    pub amount_asset: Decimal,
    pub timestamp: i64,
}

impl From<&PendingTrade> for TradeEvent {
    fn from(trade: &PendingTrade) -> Self {
        Self {
            tx_id: trade.tx_id.clone(),
            status: trade.status,
            asset_key: trade.asset_key,
            amount_settlement: trade.settlement_amount,
            amount_asset: trade.asset_amount,
            timestamp: trade.updated_at_seconds,
        }
    }
}
