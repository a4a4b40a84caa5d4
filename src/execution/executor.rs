//! Trade executor
//!
//! One trade attempt, end to end:
//! 1. read price and balance snapshots
//! 2. compute quantities (validation errors stop here)
//! 3. build the contract call
//! 4. submit once through the wallet, no retry
//! 5. `on_submitted`: track the trade as pending and fire the toast
//!
//! Once the wallet accepted a call the trade is live: local bookkeeping
//! problems after that point are reported on the [`SubmittedTrade`], never as
//! a failed submission.
//!
//! A Buy on the reference ticker stakes sBTC through `purchase-asset`.
//!
//! Chain confirmation arrives later through [`TradeExecutor::on_settled`].

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::calculator::{OrderCalculator, QuotePreview};
use super::request::{ClarityValue, TradeRequest, TradeRequestBuilder};
use super::summary::{settlement_message, submission_message, TradeSummary};
use super::tracker::PendingTradeTracker;
use crate::adapters::{BalanceLedger, ContractCaller, PriceOracle, SubmitReceipt, TradeNotifier};
use crate::config::AppConfig;
use crate::domain::{
    Asset, PendingTrade, TradeDirection, TradeEvent, TradeIntent, TradeQuantities, TradeStatus,
};
use crate::error::{Result, ThetixError};
use crate::validation::validate_tx_id;

/// Everything known about a trade once the wallet accepted it
#[derive(Debug)]
pub struct SubmittedTrade {
    pub receipt: SubmitReceipt,
    pub request: TradeRequest,
    pub quantities: TradeQuantities,
    pub pending: PendingTrade,
    /// Set when the broadcast trade could not be added to the tracker
    pub tracking_error: Option<ThetixError>,
}

impl SubmittedTrade {
    pub fn is_tracked(&self) -> bool {
        self.tracking_error.is_none()
    }
}

const SETTLEMENT_LABEL: &str = "sBTC";

pub struct TradeExecutor {
    oracle: Arc<dyn PriceOracle>,
    ledger: Arc<dyn BalanceLedger>,
    caller: Arc<dyn ContractCaller>,
    notifier: Arc<dyn TradeNotifier>,
    calculator: OrderCalculator,
    builder: TradeRequestBuilder,
    tracker: Arc<RwLock<PendingTradeTracker>>,
    max_buy_fraction: Decimal,
    stake_yield: Decimal,
}

impl TradeExecutor {
    pub fn new(
        config: &AppConfig,
        sender: impl Into<String>,
        oracle: Arc<dyn PriceOracle>,
        ledger: Arc<dyn BalanceLedger>,
        caller: Arc<dyn ContractCaller>,
        notifier: Arc<dyn TradeNotifier>,
    ) -> Result<Self> {
        config.validate().map_err(|errors| {
            ThetixError::Validation(format!("invalid configuration: {}", errors.join("; ")))
        })?;

        Ok(Self {
            oracle,
            ledger,
            caller,
            notifier,
            calculator: OrderCalculator::from_config(&config.trade),
            builder: TradeRequestBuilder::from_config(config, sender)?,
            tracker: Arc::new(RwLock::new(PendingTradeTracker::new())),
            max_buy_fraction: config.trade.max_buy_fraction,
            stake_yield: config.trade.stake_yield,
        })
    }

    /// Shared handle on the pending trade tracker
    pub fn tracker(&self) -> Arc<RwLock<PendingTradeTracker>> {
        self.tracker.clone()
    }

    pub fn calculator(&self) -> &OrderCalculator {
        &self.calculator
    }

    /// Quantities for the order form, recomputed from the current snapshots
    pub fn quote(
        &self,
        direction: TradeDirection,
        ticker: &str,
        usd_amount: Decimal,
    ) -> QuotePreview {
        match self.resolve_intent(direction, ticker, usd_amount) {
            Ok(intent) => {
                let balance = self.ledger.balance(&intent.asset.key);
                self.calculator
                    .preview(&intent, self.oracle.reference_price(), balance)
            }
            Err(err) => QuotePreview {
                quantities: TradeQuantities::zero(direction),
                error: Some(err),
            },
        }
    }

    /// Rows shown under the order form for `quote`
    pub fn summary(
        &self,
        direction: TradeDirection,
        ticker: &str,
        quote: &QuotePreview,
    ) -> TradeSummary {
        if self.is_stake(direction, ticker) {
            TradeSummary::for_stake(self.stake_yield)
        } else {
            TradeSummary::from_quote(direction, ticker, SETTLEMENT_LABEL, quote)
        }
    }

    /// Whether this order stakes the reference asset
    pub fn is_stake(&self, direction: TradeDirection, ticker: &str) -> bool {
        direction == TradeDirection::Buy && ticker == self.oracle.reference_ticker()
    }

    /// Stake `usd_amount` worth of sBTC
    pub async fn stake(&self, usd_amount: Decimal) -> Result<SubmittedTrade> {
        let reference_ticker = self.oracle.reference_ticker();
        self.submit(TradeDirection::Buy, &reference_ticker, usd_amount)
            .await
    }

    /// Compute, build and submit one trade
    pub async fn submit(
        &self,
        direction: TradeDirection,
        ticker: &str,
        usd_amount: Decimal,
    ) -> Result<SubmittedTrade> {
        let intent = self.resolve_intent(direction, ticker, usd_amount)?;
        let balance = self.ledger.balance(&intent.asset.key);
        let quantities =
            self.calculator
                .compute_trade(&intent, self.oracle.reference_price(), balance)?;

        if quantities.is_zero() {
            return Err(ThetixError::InvalidQuantity(format!(
                "nothing to {} for ${} of {}",
                direction, usd_amount, ticker
            )));
        }

        let request = self.builder.build_from_quantities(&intent.asset, &quantities)?;

        info!(
            target_fn = %request.target(),
            %direction,
            ticker,
            usd = %usd_amount,
            "submitting trade"
        );
        let receipt = self
            .caller
            .submit_contract_call(&request)
            .await
            .map_err(|e| {
                warn!(%direction, ticker, error = %e, "trade submission failed");
                ThetixError::from(e)
            })?;

        let (pending, tracking_error) = self.on_submitted(&receipt, &intent, &quantities).await;

        Ok(SubmittedTrade {
            receipt,
            request,
            quantities,
            pending,
            tracking_error,
        })
    }

    /// The wallet accepted the call: start tracking and tell the user.
    /// Never fails, the trade is already broadcast.
    async fn on_submitted(
        &self,
        receipt: &SubmitReceipt,
        intent: &TradeIntent,
        quantities: &TradeQuantities,
    ) -> (PendingTrade, Option<ThetixError>) {
        if let Err(e) = validate_tx_id(&receipt.tx_id) {
            warn!(tx_id = %receipt.tx_id, error = %e, "wallet returned an unusual transaction id");
        }

        let pending = PendingTrade::new(
            receipt.tx_id.as_str(),
            intent.asset.key,
            intent.direction,
            quantities.clamped_settlement_amount,
            quantities.asset_amount(),
            Utc::now().timestamp(),
        );
        let tracking_error = self.tracker.write().await.track(pending.clone()).err();
        if let Some(e) = &tracking_error {
            error!(tx_id = %receipt.tx_id, error = %e, "broadcast trade is not tracked");
        }

        let message = submission_message(intent.direction, intent.usd_amount, &intent.asset.ticker);
        self.notifier.notify(&TradeEvent::from(&pending), &message);
        (pending, tracking_error)
    }

    /// The chain settled a tracked trade
    pub async fn on_settled(&self, tx_id: &str, status: TradeStatus) -> Result<PendingTrade> {
        let settled = self.tracker.write().await.update_status(tx_id, status)?;

        let ticker = self
            .oracle
            .asset(&settled.asset_key)
            .map(|a| a.ticker)
            .unwrap_or_else(|| format!("asset #{}", settled.asset_key));
        let message = settlement_message(settled.direction, &ticker, status);
        self.notifier.notify(&TradeEvent::from(&settled), &message);
        Ok(settled)
    }

    /// Snapshot of tracked trades in submission order
    pub async fn entries(&self) -> Vec<PendingTrade> {
        self.tracker.read().await.entries().to_vec()
    }

    /// Drop settled trades from the tracker
    pub async fn prune_settled(&self) -> usize {
        self.tracker.write().await.prune_terminal()
    }

    /// USD amount for the "Max" button
    pub fn max_usd_amount(&self, direction: TradeDirection, ticker: &str) -> Result<Decimal> {
        let asset = self.lookup(ticker)?;
        let reference_ticker = self.oracle.reference_ticker();
        let settlement_balance = self
            .oracle
            .asset_by_ticker(&reference_ticker)
            .map(|reference| self.ledger.balance(&reference.key))
            .unwrap_or(Decimal::ZERO);

        self.calculator.max_usd_amount(
            direction,
            &asset,
            self.oracle.reference_price(),
            settlement_balance,
            self.ledger.balance(&asset.key),
            self.max_buy_fraction,
        )
    }

    /// Ask the settlement contract whether trading is paused
    pub async fn is_contract_paused(&self) -> Result<bool> {
        let call = self.builder.is_paused_call();
        match self.caller.call_read_only(&call).await? {
            ClarityValue::Bool(paused) => Ok(paused),
            other => Err(ThetixError::Internal(format!(
                "unexpected is-paused result: {}",
                other
            ))),
        }
    }

    fn lookup(&self, ticker: &str) -> Result<Asset> {
        self.oracle
            .asset_by_ticker(ticker)
            .ok_or_else(|| ThetixError::Validation(format!("Unknown asset: {}", ticker)))
    }

    fn resolve_intent(
        &self,
        direction: TradeDirection,
        ticker: &str,
        usd_amount: Decimal,
    ) -> Result<TradeIntent> {
        if direction == TradeDirection::Sell && ticker == self.oracle.reference_ticker() {
            return Err(ThetixError::Validation(format!(
                "{} is the settlement asset and can only be staked",
                ticker
            )));
        }
        let asset = self.lookup(ticker)?;
        Ok(TradeIntent::new(direction, asset, usd_amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryBalanceLedger, InMemoryPriceOracle, MockBalanceLedger, MockContractCaller,
        MockPriceOracle, MockTradeNotifier, RecordingNotifier,
    };
    use crate::domain::AssetKey;
    use crate::error::SubmissionError;
    use crate::execution::{PostConditionPrincipal, SELL_FUNCTION};
    use mockall::predicate::*;
    use rust_decimal_macros::dec;

    const USER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";

    fn oracle() -> Arc<InMemoryPriceOracle> {
        let oracle = InMemoryPriceOracle::new("BTC");
        oracle.upsert_asset(Asset::new(0, "BTC", dec!(50000)));
        oracle.upsert_asset(Asset::new(1, "ABC", dec!(2)));
        Arc::new(oracle)
    }

    fn ledger() -> Arc<InMemoryBalanceLedger> {
        let ledger = InMemoryBalanceLedger::new();
        ledger.set_balance(AssetKey(0), dec!(0.01));
        ledger.set_balance(AssetKey(1), dec!(10));
        Arc::new(ledger)
    }

    fn executor(caller: MockContractCaller, notifier: Arc<dyn TradeNotifier>) -> TradeExecutor {
        TradeExecutor::new(
            &AppConfig::default_config(),
            USER,
            oracle(),
            ledger(),
            Arc::new(caller),
            notifier,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_buy_tracks_and_notifies() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .withf(|req| req.function_name == "purchase-asset")
            .times(1)
            .returning(|_| Ok(SubmitReceipt::new("0xaa")));

        let mut notifier = MockTradeNotifier::new();
        notifier
            .expect_notify()
            .withf(|event, message| {
                event.status == TradeStatus::Pending && message == "Purchasing $100 of ABC..."
            })
            .times(1)
            .return_const(());

        let exec = executor(caller, Arc::new(notifier));
        let submitted = exec
            .submit(TradeDirection::Buy, "ABC", dec!(100))
            .await
            .unwrap();

        assert_eq!(submitted.receipt.tx_id, "0xaa");
        assert_eq!(submitted.quantities.transfer_base_units, 200_000);
        assert_eq!(submitted.pending.settlement_amount, dec!(0.002));
        assert_eq!(submitted.pending.asset_amount, dec!(50));
        assert_eq!(exec.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_sell_clamps_and_bounds_contract() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .times(1)
            .returning(|_| Ok(SubmitReceipt::new("0xbb")));

        let exec = executor(caller, Arc::new(RecordingNotifier::new()));
        let submitted = exec
            .submit(TradeDirection::Sell, "ABC", dec!(100))
            .await
            .unwrap();

        let req = &submitted.request;
        assert_eq!(req.function_name, SELL_FUNCTION);
        assert_eq!(req.function_args[1], ClarityValue::UInt(1_000_000_000));
        assert!(matches!(
            req.post_conditions[0].principal,
            PostConditionPrincipal::Contract { .. }
        ));
        // 0.0004 - 0.0000004 = 0.0003996, minus 1% tolerance = 0.000395604
        assert_eq!(req.post_conditions[0].amount, 39_560);
        assert_eq!(submitted.pending.asset_amount, dec!(10));
    }

    #[tokio::test]
    async fn test_invalid_price_never_reaches_wallet() {
        let mut caller = MockContractCaller::new();
        caller.expect_submit_contract_call().times(0);

        let oracle = oracle();
        oracle.set_price(&AssetKey(0), Decimal::ZERO);
        let exec = TradeExecutor::new(
            &AppConfig::default_config(),
            USER,
            oracle,
            ledger(),
            Arc::new(caller),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

        let err = exec
            .submit(TradeDirection::Buy, "ABC", dec!(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ThetixError::InvalidPrice { .. }));
        assert!(exec.entries().await.is_empty());

        let quote = exec.quote(TradeDirection::Buy, "ABC", dec!(100));
        assert_eq!(quote.quantities.settlement_amount, Decimal::ZERO);
        assert!(quote.error.is_some());
    }

    #[tokio::test]
    async fn test_submission_error_passes_through_without_retry() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .times(1)
            .returning(|_| Err(SubmissionError::UserRejected));

        let notifier = Arc::new(RecordingNotifier::new());
        let exec = executor(caller, notifier.clone());

        let err = exec
            .submit(TradeDirection::Buy, "ABC", dec!(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ThetixError::Submission(SubmissionError::UserRejected)
        ));
        assert!(exec.entries().await.is_empty());
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_on_settled_updates_once() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .returning(|_| Ok(SubmitReceipt::new("0xcc")));

        let notifier = Arc::new(RecordingNotifier::new());
        let exec = executor(caller, notifier.clone());
        exec.submit(TradeDirection::Buy, "ABC", dec!(10))
            .await
            .unwrap();

        let settled = exec.on_settled("0xcc", TradeStatus::Confirmed).await.unwrap();
        assert_eq!(settled.status, TradeStatus::Confirmed);
        assert!(matches!(
            exec.on_settled("0xcc", TradeStatus::Failed).await,
            Err(ThetixError::IllegalTransition { .. })
        ));

        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].1, "Purchase of ABC confirmed");

        assert_eq!(exec.prune_settled().await, 1);
        assert!(exec.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_reference_sell_and_unknown_ticker_rejected() {
        let exec = executor(MockContractCaller::new(), Arc::new(RecordingNotifier::new()));

        assert!(matches!(
            exec.submit(TradeDirection::Sell, "BTC", dec!(1)).await,
            Err(ThetixError::Validation(_))
        ));
        assert!(matches!(
            exec.submit(TradeDirection::Buy, "NOPE", dec!(1)).await,
            Err(ThetixError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_stake_purchases_reference_asset() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .withf(|req| {
                req.function_name == "purchase-asset"
                    && req.function_args
                        == vec![ClarityValue::UInt(0), ClarityValue::UInt(200_000)]
            })
            .times(1)
            .returning(|_| Ok(SubmitReceipt::new("0xee")));

        let notifier = Arc::new(RecordingNotifier::new());
        let exec = executor(caller, notifier.clone());
        assert!(exec.is_stake(TradeDirection::Buy, "BTC"));
        assert!(!exec.is_stake(TradeDirection::Buy, "ABC"));

        let staked = exec.stake(dec!(100)).await.unwrap();
        assert!(staked.is_tracked());
        assert_eq!(staked.pending.asset_key, AssetKey(0));
        assert_eq!(notifier.events()[0].1, "Purchasing $100 of BTC...");

        let quote = exec.quote(TradeDirection::Buy, "BTC", dec!(100));
        let summary = exec.summary(TradeDirection::Buy, "BTC", &quote);
        assert_eq!(summary.rows[0].1, "6.5%");
        let summary = exec.summary(TradeDirection::Buy, "ABC", &quote);
        assert_eq!(summary.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_broadcast_trade_with_odd_tx_id_is_still_tracked() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .times(1)
            .returning(|_| Ok(SubmitReceipt::new("tx-not-hex")));

        let notifier = Arc::new(RecordingNotifier::new());
        let exec = executor(caller, notifier.clone());

        let submitted = exec
            .submit(TradeDirection::Buy, "ABC", dec!(100))
            .await
            .unwrap();
        assert!(submitted.is_tracked());
        assert_eq!(submitted.receipt.tx_id, "tx-not-hex");
        assert_eq!(exec.entries().await.len(), 1);
        assert_eq!(notifier.events().len(), 1);

        // the chain notification for it is still accepted
        exec.on_settled("tx-not-hex", TradeStatus::Confirmed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tracking_failure_keeps_receipt() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_submit_contract_call()
            .times(2)
            .returning(|_| Ok(SubmitReceipt::new("0xdd")));

        let notifier = Arc::new(RecordingNotifier::new());
        let exec = executor(caller, notifier.clone());

        let first = exec
            .submit(TradeDirection::Buy, "ABC", dec!(10))
            .await
            .unwrap();
        assert!(first.is_tracked());

        let second = exec
            .submit(TradeDirection::Buy, "ABC", dec!(10))
            .await
            .unwrap();
        assert!(!second.is_tracked());
        assert!(matches!(
            second.tracking_error,
            Some(ThetixError::DuplicateTransaction { .. })
        ));
        assert_eq!(second.receipt.tx_id, "0xdd");
        assert_eq!(exec.entries().await.len(), 1);
        // the user still hears about the broadcast trade
        assert_eq!(notifier.events().len(), 2);
    }

    #[test]
    fn test_quote_reads_injected_snapshots() {
        let mut oracle = MockPriceOracle::new();
        oracle
            .expect_reference_ticker()
            .return_const("BTC".to_string());
        oracle
            .expect_asset_by_ticker()
            .withf(|ticker| ticker == "ABC")
            .returning(|_| Some(Asset::new(1, "ABC", dec!(2))));
        oracle.expect_reference_price().return_const(Decimal::ZERO);

        let mut ledger = MockBalanceLedger::new();
        ledger
            .expect_balance()
            .with(eq(AssetKey(1)))
            .times(1)
            .return_const(dec!(10));

        let exec = TradeExecutor::new(
            &AppConfig::default_config(),
            USER,
            Arc::new(oracle),
            Arc::new(ledger),
            Arc::new(MockContractCaller::new()),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

        let quote = exec.quote(TradeDirection::Sell, "ABC", dec!(100));
        assert_eq!(quote.quantities.transfer_amount, Decimal::ZERO);
        assert!(matches!(
            quote.into_result(),
            Err(ThetixError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_max_usd_amount_overflow_is_error() {
        let mut oracle = MockPriceOracle::new();
        oracle
            .expect_reference_ticker()
            .return_const("BTC".to_string());
        oracle.expect_asset_by_ticker().returning(|ticker| match ticker {
            "BTC" => Some(Asset::new(0, "BTC", dec!(50000))),
            "ABC" => Some(Asset::new(1, "ABC", dec!(1000000000))),
            _ => None,
        });
        oracle.expect_reference_price().return_const(dec!(50000));

        let mut ledger = MockBalanceLedger::new();
        ledger
            .expect_balance()
            .return_const(dec!(100000000000000000000));

        let exec = TradeExecutor::new(
            &AppConfig::default_config(),
            USER,
            Arc::new(oracle),
            Arc::new(ledger),
            Arc::new(MockContractCaller::new()),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

        assert!(matches!(
            exec.max_usd_amount(TradeDirection::Sell, "ABC"),
            Err(ThetixError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_amount_is_not_submitted() {
        let mut caller = MockContractCaller::new();
        caller.expect_submit_contract_call().times(0);
        let exec = executor(caller, Arc::new(RecordingNotifier::new()));

        assert!(matches!(
            exec.submit(TradeDirection::Buy, "ABC", Decimal::ZERO).await,
            Err(ThetixError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_max_usd_amount() {
        let exec = executor(MockContractCaller::new(), Arc::new(RecordingNotifier::new()));
        // 0.01 sBTC * 50000 * 0.5
        assert_eq!(
            exec.max_usd_amount(TradeDirection::Buy, "ABC").unwrap(),
            dec!(250)
        );
        // 10 ABC * 2
        assert_eq!(
            exec.max_usd_amount(TradeDirection::Sell, "ABC").unwrap(),
            dec!(20)
        );
    }

    #[tokio::test]
    async fn test_is_contract_paused() {
        let mut caller = MockContractCaller::new();
        caller
            .expect_call_read_only()
            .with(function(|call: &crate::execution::ReadOnlyCall| {
                call.function_name == "is-paused"
            }))
            .times(1)
            .returning(|_| Ok(ClarityValue::Bool(true)));

        let exec = executor(caller, Arc::new(RecordingNotifier::new()));
        assert!(exec.is_contract_paused().await.unwrap());
    }
}
