//! USD-denominated order execution for sBTC-settled asset trading

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod execution;
pub mod logging;
pub mod validation;

pub use adapters::{
    BalanceLedger, ContractCaller, InMemoryBalanceLedger, InMemoryPriceOracle, PriceOracle,
    RecordingNotifier, SubmitReceipt, TracingNotifier, TradeNotifier,
};
pub use config::AppConfig;
pub use domain::{
    Asset, AssetKey, PendingTrade, TradeDirection, TradeEvent, TradeIntent, TradeQuantities,
    TradeStatus,
};
pub use error::{Result, SubmissionError, ThetixError};
pub use execution::{
    OrderCalculator, PendingTradeTracker, QuotePreview, SubmittedTrade, TradeExecutor,
    TradeRequest, TradeRequestBuilder,
};
