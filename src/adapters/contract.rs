//! Contract-call collaborator
//!
//! Signing, serialization and broadcast live in the wallet / chain SDK. The
//! engine only hands over a built request and gets back a transaction id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;
use crate::execution::{ClarityValue, ReadOnlyCall, TradeRequest};

/// Acknowledgment returned once the wallet accepted and broadcast a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub tx_id: String,
}

impl SubmitReceipt {
    pub fn new(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
        }
    }
}

/// Wallet / chain SDK surface used by the executor.
///
/// Calls are single-shot: implementations must not retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractCaller: Send + Sync {
    /// Sign and broadcast a contract call
    async fn submit_contract_call(
        &self,
        request: &TradeRequest,
    ) -> std::result::Result<SubmitReceipt, SubmissionError>;

    /// Evaluate a read-only function
    async fn call_read_only(
        &self,
        call: &ReadOnlyCall,
    ) -> std::result::Result<ClarityValue, SubmissionError>;
}
