//! Toast notifications
//!
//! Fire-and-forget: the engine never waits on or inspects the outcome.

use std::sync::Mutex;
use tracing::info;

use crate::domain::TradeEvent;

#[cfg_attr(test, mockall::automock)]
pub trait TradeNotifier: Send + Sync {
    fn notify(&self, event: &TradeEvent, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TradeNotifier for TracingNotifier {
    fn notify(&self, event: &TradeEvent, message: &str) {
        info!(
            tx_id = %event.tx_id,
            status = %event.status,
            asset = %event.asset_key,
            amount_settlement = %event.amount_settlement,
            amount_asset = %event.amount_asset,
            "{}",
            message
        );
    }
}

/// Notifier that keeps every toast in memory, in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(TradeEvent, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TradeEvent, String)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TradeNotifier for RecordingNotifier {
    fn notify(&self, event: &TradeEvent, message: &str) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((event.clone(), message.to_string()));
    }
}
