//! Quote -> submit -> settle against in-memory collaborators

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thetix::execution::{ClarityValue, ReadOnlyCall, TradeSummary};
use thetix::{
    AppConfig, Asset, AssetKey, ContractCaller, InMemoryBalanceLedger, InMemoryPriceOracle,
    RecordingNotifier, SubmissionError, SubmitReceipt, ThetixError, TradeDirection, TradeExecutor,
    TradeRequest, TradeStatus,
};

const USER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";

/// Wallet stand-in handing out sequential tx ids
#[derive(Default)]
struct FakeWallet {
    calls: AtomicUsize,
    requests: Mutex<Vec<TradeRequest>>,
    reject: bool,
    paused: bool,
}

#[async_trait]
impl ContractCaller for FakeWallet {
    async fn submit_contract_call(
        &self,
        request: &TradeRequest,
    ) -> Result<SubmitReceipt, SubmissionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(SubmissionError::UserRejected);
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(SubmitReceipt::new(format!("0x{:064x}", n + 1)))
    }

    async fn call_read_only(&self, _call: &ReadOnlyCall) -> Result<ClarityValue, SubmissionError> {
        Ok(ClarityValue::Bool(self.paused))
    }
}

struct Harness {
    executor: TradeExecutor,
    oracle: Arc<InMemoryPriceOracle>,
    wallet: Arc<FakeWallet>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(wallet: FakeWallet) -> Harness {
    let config = AppConfig::load_from("config").unwrap_or_else(|_| AppConfig::default_config());

    let oracle = Arc::new(InMemoryPriceOracle::new(config.trade.reference_ticker.clone()));
    oracle.upsert_asset(Asset::new(0, "BTC", dec!(50000)));
    oracle.upsert_asset(Asset::new(1, "ABC", dec!(2)));
    oracle.upsert_asset(Asset::new(2, "XYZ", dec!(125)));

    let ledger = Arc::new(InMemoryBalanceLedger::new());
    ledger.set_balance(AssetKey(0), dec!(0.02));
    ledger.set_balance(AssetKey(2), dec!(1.5));

    let wallet = Arc::new(wallet);
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = TradeExecutor::new(
        &config,
        USER,
        oracle.clone(),
        ledger,
        wallet.clone(),
        notifier.clone(),
    )
    .unwrap();

    Harness {
        executor,
        oracle,
        wallet,
        notifier,
    }
}

#[tokio::test]
async fn buy_then_sell_then_settle() {
    let h = harness(FakeWallet::default());

    let quote = h.executor.quote(TradeDirection::Buy, "ABC", dec!(100));
    assert!(quote.is_ok());
    let summary = TradeSummary::from_quote(TradeDirection::Buy, "ABC", "sBTC", &quote);
    assert_eq!(summary.rows[2].1, "49.95");

    let buy = h
        .executor
        .submit(TradeDirection::Buy, "ABC", dec!(100))
        .await
        .unwrap();
    let sell = h
        .executor
        .submit(TradeDirection::Sell, "XYZ", dec!(500))
        .await
        .unwrap();

    // 500 USD of XYZ is 4 units, only 1.5 held
    assert!(sell.quantities.clamped);
    assert_eq!(sell.quantities.transfer_base_units, 150_000_000);

    let entries = h.executor.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].tx_id, buy.receipt.tx_id);
    assert!(entries.iter().all(|t| t.status == TradeStatus::Pending));

    h.executor
        .on_settled(&sell.receipt.tx_id, TradeStatus::Failed)
        .await
        .unwrap();
    h.executor
        .on_settled(&buy.receipt.tx_id, TradeStatus::Confirmed)
        .await
        .unwrap();

    let messages: Vec<String> = h.notifier.events().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        messages,
        vec![
            "Purchasing $100 of ABC...",
            "Selling $500 of XYZ...",
            "Sale of XYZ failed",
            "Purchase of ABC confirmed",
        ]
    );

    let stats = h.executor.tracker().read().await.stats();
    assert_eq!((stats.pending, stats.confirmed, stats.failed), (0, 1, 1));
    assert_eq!(h.wallet.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stale_price_blocks_submission() {
    let h = harness(FakeWallet::default());
    h.oracle.set_price(&AssetKey(1), Decimal::ZERO);

    let err = h
        .executor
        .submit(TradeDirection::Buy, "ABC", dec!(100))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.wallet.calls.load(Ordering::SeqCst), 0);
    assert!(h.notifier.events().is_empty());
}

#[tokio::test]
async fn rejected_submission_is_not_tracked_or_retried() {
    let h = harness(FakeWallet {
        reject: true,
        ..FakeWallet::default()
    });

    let err = h
        .executor
        .submit(TradeDirection::Buy, "ABC", dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ThetixError::Submission(SubmissionError::UserRejected)
    ));
    assert_eq!(h.wallet.calls.load(Ordering::SeqCst), 1);
    assert!(h.executor.entries().await.is_empty());
}

#[tokio::test]
async fn settling_unknown_transaction_is_misuse() {
    let h = harness(FakeWallet::default());
    let err = h
        .executor
        .on_settled("0xdead", TradeStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(err.is_misuse());
    assert!(h.notifier.events().is_empty());
}

#[test]
fn paused_flag_and_max_amounts() {
    let h = harness(FakeWallet {
        paused: true,
        ..FakeWallet::default()
    });

    assert!(tokio_test::block_on(h.executor.is_contract_paused()).unwrap());
    // 0.02 * 50000 * 0.5
    assert_eq!(
        h.executor
            .max_usd_amount(TradeDirection::Buy, "XYZ")
            .unwrap(),
        dec!(500)
    );
    // 1.5 * 125
    assert_eq!(
        h.executor
            .max_usd_amount(TradeDirection::Sell, "XYZ")
            .unwrap(),
        dec!(187.5)
    );
}

#[tokio::test]
async fn staking_reference_asset_uses_purchase() {
    let h = harness(FakeWallet::default());

    let quote = h.executor.quote(TradeDirection::Buy, "BTC", dec!(100));
    let summary = h.executor.summary(TradeDirection::Buy, "BTC", &quote);
    assert_eq!(
        summary.rows,
        vec![("Yield Percentage :".to_string(), "6.5%".to_string())]
    );

    let staked = h.executor.stake(dec!(100)).await.unwrap();
    assert!(staked.is_tracked());
    assert_eq!(staked.request.function_name, "purchase-asset");
    assert_eq!(
        staked.request.function_args,
        vec![ClarityValue::UInt(0), ClarityValue::UInt(200_000)]
    );
    assert_eq!(h.notifier.events()[0].1, "Purchasing $100 of BTC...");

    let err = h
        .executor
        .submit(TradeDirection::Sell, "BTC", dec!(100))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}
