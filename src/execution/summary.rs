//! Display rows and toast messages derived from a quote

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::calculator::QuotePreview;
use crate::domain::{TradeDirection, TradeStatus};

/// Fraction digits shown for on-chain amounts
pub const DISPLAY_FRACTION_DIGITS: u32 = 10;

/// Label / value pairs shown under the order form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSummary {
    pub rows: Vec<(String, String)>,
}

impl TradeSummary {
    pub fn from_quote(
        direction: TradeDirection,
        ticker: &str,
        settlement_ticker: &str,
        quote: &QuotePreview,
    ) -> Self {
        let q = &quote.quantities;
        let (spend_label, asset_label) = match direction {
            TradeDirection::Buy => ("you spend", "get"),
            TradeDirection::Sell => ("you receive", "sell"),
        };

        let rows = vec![
            (
                format!("Amount {} ({}):", spend_label, settlement_ticker),
                format_amount(q.clamped_settlement_amount, DISPLAY_FRACTION_DIGITS),
            ),
            (
                format!("Trading fee ({}):", settlement_ticker),
                format_amount(q.fee_amount, DISPLAY_FRACTION_DIGITS),
            ),
            (
                format!("You {} ({}):", asset_label, ticker),
                format_amount(q.display_amount, DISPLAY_FRACTION_DIGITS),
            ),
        ];

        Self { rows }
    }

    /// Staking the reference asset shows the advertised yield instead
    pub fn for_stake(stake_yield: Decimal) -> Self {
        let percent = (stake_yield * Decimal::ONE_HUNDRED).normalize();
        Self {
            rows: vec![("Yield Percentage :".to_string(), format!("{}%", percent))],
        }
    }
}

/// `1234.5` -> `"1,234.5"`, at most `max_fraction_digits` digits after the point
pub fn format_amount(value: Decimal, max_fraction_digits: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Toast shown once the wallet accepted the call
pub fn submission_message(direction: TradeDirection, usd_amount: Decimal, ticker: &str) -> String {
    format!(
        "{} ${} of {}...",
        direction.progressive(),
        usd_amount.normalize(),
        ticker
    )
}

/// Toast shown when the chain settled the trade
pub fn settlement_message(direction: TradeDirection, ticker: &str, status: TradeStatus) -> String {
    let noun = match direction {
        TradeDirection::Buy => "Purchase",
        TradeDirection::Sell => "Sale",
    };
    match status {
        TradeStatus::Confirmed => format!("{} of {} confirmed", noun, ticker),
        TradeStatus::Failed => format!("{} of {} failed", noun, ticker),
        TradeStatus::Pending => format!("{} of {} pending", noun, ticker),
    }
}
