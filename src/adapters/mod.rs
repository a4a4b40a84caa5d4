pub mod contract;
pub mod ledger;
pub mod notifier;
pub mod oracle;

pub use contract::{ContractCaller, SubmitReceipt};
pub use ledger::{BalanceLedger, InMemoryBalanceLedger};
pub use notifier::{RecordingNotifier, TracingNotifier, TradeNotifier};
pub use oracle::{InMemoryPriceOracle, PriceOracle};

#[cfg(test)]
pub use contract::MockContractCaller;
#[cfg(test)]
pub use ledger::MockBalanceLedger;
#[cfg(test)]
pub use notifier::MockTradeNotifier;
#[cfg(test)]
pub use oracle::MockPriceOracle;
