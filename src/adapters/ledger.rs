//! Balance ledger adapter
//!
//! The engine only reads balances. Writes come from wallet/ledger events
//! delivered by the host.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::AssetKey;

/// Read side of the user's holdings
#[cfg_attr(test, mockall::automock)]
pub trait BalanceLedger: Send + Sync {
    /// Current holding of `key` in human units, zero if none
    fn balance(&self, key: &AssetKey) -> Decimal;
}

/// Holdings snapshot kept in memory
#[derive(Clone, Default)]
pub struct InMemoryBalanceLedger {
    balances: Arc<DashMap<AssetKey, Decimal>>,
}

impl InMemoryBalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the holding for `key`; negative values are stored as zero
    pub fn set_balance(&self, key: AssetKey, amount: Decimal) {
        let amount = amount.max(Decimal::ZERO);
        debug!(key = %key, %amount, "balance updated");
        self.balances.insert(key, amount);
    }

    /// Replace every holding at once
    pub fn replace_all(&self, balances: HashMap<AssetKey, Decimal>) {
        self.balances.clear();
        for (key, amount) in balances {
            self.set_balance(key, amount);
        }
    }

    pub fn snapshot(&self) -> HashMap<AssetKey, Decimal> {
        self.balances
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }
}

impl BalanceLedger for InMemoryBalanceLedger {
    fn balance(&self, key: &AssetKey) -> Decimal {
        self.balances
            .get(key)
            .map(|b| *b.value())
            .unwrap_or(Decimal::ZERO)
    }
}
