use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the order execution engine
#[derive(Error, Debug)]
pub enum ThetixError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Order calculation errors
    #[error("Invalid price for {asset}: {price}")]
    InvalidPrice { asset: String, price: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    // Pending trade tracking errors
    #[error("Duplicate transaction: {tx_id}")]
    DuplicateTransaction { tx_id: String },

    #[error("Unknown transaction: {tx_id}")]
    UnknownTransaction { tx_id: String },

    #[error("Illegal transition for {tx_id}: from {from} to {to}")]
    IllegalTransition {
        tx_id: String,
        from: String,
        to: String,
    },

    // Submission errors from the contract caller
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ThetixError {
    /// Local validation failure raised before any request is built.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ThetixError::InvalidPrice { .. }
                | ThetixError::InvalidAmount(_)
                | ThetixError::InvalidQuantity(_)
                | ThetixError::DivisionByZero(_)
                | ThetixError::Validation(_)
        )
    }

    /// Tracker misuse by the caller (a programming error, not a market condition).
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            ThetixError::DuplicateTransaction { .. }
                | ThetixError::UnknownTransaction { .. }
                | ThetixError::IllegalTransition { .. }
        )
    }
}

/// Result type alias for ThetixError
pub type Result<T> = std::result::Result<T, ThetixError>;

/// Errors surfaced by the external contract caller.
///
/// These are terminal for a trade attempt: nothing is retried, the user has
/// to start a new trade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("User rejected the contract call")]
    UserRejected,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Contract rejected the call: {0}")]
    ContractRejected(String),
}
