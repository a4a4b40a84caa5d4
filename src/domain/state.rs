use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a submitted trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Broadcast, waiting for the chain
    Pending,
    /// Included and successful
    Confirmed,
    /// Aborted or dropped by the chain
    Failed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Confirmed => "confirmed",
            TradeStatus::Failed => "failed",
        }
    }

    /// Check if this status can transition to another status
    pub fn can_transition_to(&self, target: TradeStatus) -> bool {
        use TradeStatus::*;

        matches!((self, target), (Pending, Confirmed) | (Pending, Failed))
    }

    /// Get valid next statuses from the current one
    pub fn valid_transitions(&self) -> Vec<TradeStatus> {
        use TradeStatus::*;

        match self {
            Pending => vec![Confirmed, Failed],
            Confirmed | Failed => vec![],
        }
    }

    /// Terminal statuses absorb every further update
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Confirmed | TradeStatus::Failed)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TradeStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TradeStatus::Pending),
            "confirmed" | "success" => Ok(TradeStatus::Confirmed),
            "failed" | "abort_by_response" | "abort_by_post_condition" => Ok(TradeStatus::Failed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}
