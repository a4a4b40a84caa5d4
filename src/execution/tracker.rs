//! Pending trade tracker
//!
//! Keeps every submitted trade keyed by transaction id, in submission order.
//! Entries move `Pending -> Confirmed | Failed` on chain notifications and
//! stay until the owner prunes them.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::domain::{AssetKey, PendingTrade, TradeDirection, TradeStatus};
use crate::error::{Result, ThetixError};

/// Counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub pending: usize,
    pub confirmed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct PendingTradeTracker {
    /// Entries in insertion order
    entries: Vec<PendingTrade>,
    /// tx_id -> position in `entries`
    index: HashMap<String, usize>,
}

impl PendingTradeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly submitted trade, stamped with the current time
    pub fn record_submission(
        &mut self,
        tx_id: &str,
        asset_key: AssetKey,
        direction: TradeDirection,
        settlement_amount: Decimal,
        asset_amount: Decimal,
    ) -> Result<PendingTrade> {
        self.record_submission_at(
            tx_id,
            asset_key,
            direction,
            settlement_amount,
            asset_amount,
            Utc::now().timestamp(),
        )
    }

    /// Track a submitted trade with an explicit unix timestamp
    pub fn record_submission_at(
        &mut self,
        tx_id: &str,
        asset_key: AssetKey,
        direction: TradeDirection,
        settlement_amount: Decimal,
        asset_amount: Decimal,
        timestamp_seconds: i64,
    ) -> Result<PendingTrade> {
        self.track(PendingTrade::new(
            tx_id,
            asset_key,
            direction,
            settlement_amount,
            asset_amount,
            timestamp_seconds,
        ))
    }

    /// Track an already built pending trade
    pub fn track(&mut self, trade: PendingTrade) -> Result<PendingTrade> {
        let tx_id = trade.tx_id.as_str();
        if tx_id.trim().is_empty() {
            error!("cannot track a transaction without id");
            return Err(ThetixError::Validation(
                "Transaction ID cannot be empty".to_string(),
            ));
        }
        if self.index.contains_key(tx_id) {
            error!(tx_id, "transaction already tracked");
            return Err(ThetixError::DuplicateTransaction {
                tx_id: tx_id.to_string(),
            });
        }

        info!(
            tx_id,
            asset = %trade.asset_key,
            direction = %trade.direction,
            settlement = %trade.settlement_amount,
            "tracking pending trade"
        );
        self.index.insert(trade.tx_id.clone(), self.entries.len());
        self.entries.push(trade.clone());
        Ok(trade)
    }

    /// Move a pending trade to `new_status`
    pub fn update_status(&mut self, tx_id: &str, new_status: TradeStatus) -> Result<PendingTrade> {
        self.update_status_at(tx_id, new_status, Utc::now().timestamp())
    }

    /// Move a pending trade to `new_status` with an explicit unix timestamp
    pub fn update_status_at(
        &mut self,
        tx_id: &str,
        new_status: TradeStatus,
        timestamp_seconds: i64,
    ) -> Result<PendingTrade> {
        let Some(&position) = self.index.get(tx_id) else {
            error!(tx_id, "status update for untracked transaction");
            return Err(ThetixError::UnknownTransaction {
                tx_id: tx_id.to_string(),
            });
        };

        let current = &self.entries[position];
        if !current.status.can_transition_to(new_status) {
            error!(
                tx_id,
                from = %current.status,
                to = %new_status,
                "illegal trade status transition"
            );
            return Err(ThetixError::IllegalTransition {
                tx_id: tx_id.to_string(),
                from: current.status.to_string(),
                to: new_status.to_string(),
            });
        }

        // Whole-entry replacement: readers see the old entry or the new one.
        let updated = PendingTrade {
            status: new_status,
            updated_at_seconds: timestamp_seconds,
            ..current.clone()
        };
        self.entries[position] = updated.clone();

        info!(tx_id, status = %new_status, "trade settled");
        Ok(updated)
    }

    pub fn get(&self, tx_id: &str) -> Option<&PendingTrade> {
        self.index.get(tx_id).map(|&i| &self.entries[i])
    }

    /// Every tracked entry in submission order
    pub fn entries(&self) -> &[PendingTrade] {
        &self.entries
    }

    /// Entries still waiting on the chain, in submission order
    pub fn pending(&self) -> Vec<&PendingTrade> {
        self.entries
            .iter()
            .filter(|t| t.status == TradeStatus::Pending)
            .collect()
    }

    pub fn stats(&self) -> TrackerStats {
        self.entries
            .iter()
            .fold(TrackerStats::default(), |mut stats, t| {
                match t.status {
                    TradeStatus::Pending => stats.pending += 1,
                    TradeStatus::Confirmed => stats.confirmed += 1,
                    TradeStatus::Failed => stats.failed += 1,
                }
                stats
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every terminal entry. Returns how many were removed.
    pub fn prune_terminal(&mut self) -> usize {
        self.retain(|t| !t.is_terminal())
    }

    /// Drop terminal entries last updated before `cutoff_seconds`
    pub fn prune_terminal_before(&mut self, cutoff_seconds: i64) -> usize {
        self.retain(|t| !(t.is_terminal() && t.updated_at_seconds < cutoff_seconds))
    }

    fn retain<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&PendingTrade) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|t| keep(t));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, t)| (t.tx_id.clone(), i))
            .collect();

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "pruned settled trades");
        }
        removed
    }
}
