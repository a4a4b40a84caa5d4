use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default base-unit precision for listed assets (same as sBTC)
pub const DEFAULT_ASSET_DECIMALS: u32 = 8;

/// On-chain identifier of a listed asset, passed to the contract as a `uint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(pub u64);

impl AssetKey {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AssetKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A tradable asset with its last known USD price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub key: AssetKey,
    pub ticker: String,
    /// Best-effort USD quote; zero means unknown
    pub price: Decimal,
    /// Base-unit precision of the asset
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    DEFAULT_ASSET_DECIMALS
}

impl Asset {
    pub fn new(key: impl Into<AssetKey>, ticker: impl Into<String>, price: Decimal) -> Self {
        Self {
            key: key.into(),
            ticker: ticker.into(),
            price,
            decimals: DEFAULT_ASSET_DECIMALS,
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Whether the quote can be used for pricing
    pub fn has_price(&self) -> bool {
        self.price > Decimal::ZERO
    }

    /// USD value of `quantity` units at the current quote, `None` on overflow
    pub fn usd_value(&self, quantity: Decimal) -> Option<Decimal> {
        if self.has_price() {
            quantity.checked_mul(self.price)
        } else {
            Some(Decimal::ZERO)
        }
    }
}

/// Trade direction relative to the listed asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }

    /// Verb used in user-facing messages
    pub fn progressive(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "Purchasing",
            TradeDirection::Sell => "Selling",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TradeDirection {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeDirection::Buy),
            "sell" => Ok(TradeDirection::Sell),
            _ => Err(format!("Unknown trade direction: {}", s)),
        }
    }
}
