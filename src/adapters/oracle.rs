//! Price oracle adapter
//!
//! Last-known USD quotes for listed assets and for the reference
//! (settlement) asset. Quotes are best effort: an unknown price reads as zero
//! and every consumer must treat zero as "cannot price".

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{Asset, AssetKey};

/// Read side of the price feed
#[cfg_attr(test, mockall::automock)]
pub trait PriceOracle: Send + Sync {
    /// Last quote for `key`, zero if unknown
    fn price(&self, key: &AssetKey) -> Decimal;

    /// Last quote of the reference asset, zero if unknown
    fn reference_price(&self) -> Decimal;

    /// Ticker of the reference asset
    fn reference_ticker(&self) -> String;

    /// Look up a listed asset with its current quote
    fn asset_by_ticker(&self, ticker: &str) -> Option<Asset>;

    /// Look up a listed asset by key
    fn asset(&self, key: &AssetKey) -> Option<Asset>;
}

/// Price snapshot kept in memory and fed by an external poller
#[derive(Clone)]
pub struct InMemoryPriceOracle {
    assets: Arc<DashMap<AssetKey, Asset>>,
    tickers: Arc<DashMap<String, AssetKey>>,
    reference_ticker: String,
}

impl InMemoryPriceOracle {
    pub fn new(reference_ticker: impl Into<String>) -> Self {
        Self {
            assets: Arc::new(DashMap::new()),
            tickers: Arc::new(DashMap::new()),
            reference_ticker: reference_ticker.into(),
        }
    }

    /// Insert or replace a listed asset
    pub fn upsert_asset(&self, asset: Asset) {
        debug!(key = %asset.key, ticker = %asset.ticker, price = %asset.price, "asset quote updated");
        self.tickers.insert(asset.ticker.clone(), asset.key);
        self.assets.insert(asset.key, asset);
    }

    /// Update the quote of a known asset. Returns false if the asset is not listed.
    pub fn set_price(&self, key: &AssetKey, price: Decimal) -> bool {
        match self.assets.get_mut(key) {
            Some(mut asset) => {
                if price < Decimal::ZERO {
                    warn!(key = %key, %price, "negative quote stored as unknown");
                    asset.price = Decimal::ZERO;
                } else {
                    asset.price = price;
                }
                true
            }
            None => false,
        }
    }

    /// All listed assets, ordered by key
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self.assets.iter().map(|a| a.value().clone()).collect();
        assets.sort_by_key(|a| a.key);
        assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl PriceOracle for InMemoryPriceOracle {
    fn price(&self, key: &AssetKey) -> Decimal {
        self.assets
            .get(key)
            .map(|a| a.price)
            .unwrap_or(Decimal::ZERO)
    }

    fn reference_price(&self) -> Decimal {
        self.asset_by_ticker(&self.reference_ticker)
            .map(|a| a.price)
            .unwrap_or(Decimal::ZERO)
    }

    fn reference_ticker(&self) -> String {
        self.reference_ticker.clone()
    }

    fn asset_by_ticker(&self, ticker: &str) -> Option<Asset> {
        let key = *self.tickers.get(ticker)?;
        self.asset(&key)
    }

    fn asset(&self, key: &AssetKey) -> Option<Asset> {
        self.assets.get(key).map(|a| a.value().clone())
    }
}
