pub mod calculator;
pub mod executor;
pub mod request;
pub mod summary;
pub mod tracker;
pub mod units;

pub use calculator::{OrderCalculator, QuotePreview};
pub use executor::{SubmittedTrade, TradeExecutor};
pub use request::{
    AdminAction, ClarityValue, FungibleConditionCode, FungiblePostCondition, PostConditionMode,
    PostConditionPrincipal, ReadOnlyCall, TradeRequest, TradeRequestBuilder,
    EMERGENCY_WITHDRAW_FUNCTION, IS_PAUSED_FUNCTION, PAUSE_FUNCTION, PURCHASE_FUNCTION,
    SELL_FUNCTION, UNPAUSE_FUNCTION,
};
pub use summary::{
    format_amount, settlement_message, submission_message, TradeSummary, DISPLAY_FRACTION_DIGITS,
};
pub use tracker::{PendingTradeTracker, TrackerStats};
pub use units::{from_base_units, to_base_units};
