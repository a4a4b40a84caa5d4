use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest base-unit precision accepted for the settlement asset.
pub const MAX_DECIMALS: u32 = 18;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub contract: ContractConfig,
    #[serde(default)]
    pub trade: TradeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployer address of the trading contract
    pub address: String,
    /// Contract name (e.g., "bitthetix")
    pub name: String,
    /// Fungible token used for settlement
    pub settlement_token: TokenConfig,
}

/// Fully qualified fungible token (`address.contract::asset`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub contract_address: String,
    pub contract_name: String,
    pub asset_name: String,
}

/// Amount asserted by the settlement post-condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostConditionFloor {
    /// Bound by the settlement amount the trade is expected to move
    ExpectedSettlement,
    /// Legacy floor of zero; asserts nothing
    Zero,
}

impl Default for PostConditionFloor {
    fn default() -> Self {
        Self::ExpectedSettlement
    }
}

/// Which quantity is sent on-chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferBasis {
    /// Gross quantity; the contract charges the fee itself
    Gross,
    /// Quantity with the trading fee already netted out
    Net,
}

impl Default for TransferBasis {
    fn default() -> Self {
        Self::Gross
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeConfig {
    /// Flat trading fee (e.g., 0.001 = 0.1%)
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Base-unit precision of the settlement asset (sBTC uses 8)
    #[serde(default = "default_settlement_decimals")]
    pub settlement_decimals: u32,
    /// Ticker whose price is the reference price
    #[serde(default = "default_reference_ticker")]
    pub reference_ticker: String,
    /// Share of the settlement balance offered by the "Max" buy helper
    #[serde(default = "default_max_buy_fraction")]
    pub max_buy_fraction: Decimal,
    /// Fixed tolerance subtracted from the expected Sell proceeds (e.g., 0.01 = 1%)
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: Decimal,
    /// Advertised yield for staking the reference asset (e.g., 0.065 = 6.5%)
    #[serde(default = "default_stake_yield")]
    pub stake_yield: Decimal,
    #[serde(default)]
    pub post_condition_floor: PostConditionFloor,
    #[serde(default)]
    pub transfer_basis: TransferBasis,
}

fn default_fee_rate() -> Decimal {
    dec!(0.001)
}

fn default_settlement_decimals() -> u32 {
    8
}

fn default_reference_ticker() -> String {
    "BTC".to_string()
}

fn default_max_buy_fraction() -> Decimal {
    dec!(0.5)
}

fn default_stake_yield() -> Decimal {
    dec!(0.065)
}

fn default_slippage_tolerance() -> Decimal {
    dec!(0.01)
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            settlement_decimals: default_settlement_decimals(),
            reference_ticker: default_reference_ticker(),
            max_buy_fraction: default_max_buy_fraction(),
            slippage_tolerance: default_slippage_tolerance(),
            stake_yield: default_stake_yield(),
            post_condition_floor: PostConditionFloor::default(),
            transfer_basis: TransferBasis::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for a daily rolling log file (console only when unset)
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("trade.fee_rate", "0.001")?
            .set_default("trade.settlement_decimals", 8)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g., config/mainnet.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("THETIX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // THETIX_CONTRACT__NAME, THETIX_TRADE__FEE_RATE, ...
            .add_source(
                Environment::with_prefix("THETIX")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration pointing at the devnet deployment
    pub fn default_config() -> Self {
        let deployer = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".to_string();

        Self {
            contract: ContractConfig {
                address: deployer.clone(),
                name: "bitthetix".to_string(),
                settlement_token: TokenConfig {
                    contract_address: deployer,
                    contract_name: "sbtc".to_string(),
                    asset_name: "sbtc".to_string(),
                },
            },
            trade: TradeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.contract.address.trim().is_empty() {
            errors.push("contract.address must be set".to_string());
        }
        if self.contract.name.trim().is_empty() {
            errors.push("contract.name must be set".to_string());
        }
        let token = &self.contract.settlement_token;
        if token.contract_address.trim().is_empty()
            || token.contract_name.trim().is_empty()
            || token.asset_name.trim().is_empty()
        {
            errors.push("contract.settlement_token must be fully qualified".to_string());
        }

        let trade = &self.trade;
        if trade.fee_rate < Decimal::ZERO || trade.fee_rate >= Decimal::ONE {
            errors.push(format!("fee_rate must be in [0, 1): {}", trade.fee_rate));
        }
        if trade.settlement_decimals > MAX_DECIMALS {
            errors.push(format!(
                "settlement_decimals {} exceeds maximum {}",
                trade.settlement_decimals, MAX_DECIMALS
            ));
        }
        if trade.reference_ticker.trim().is_empty() {
            errors.push("reference_ticker must be set".to_string());
        }
        if trade.max_buy_fraction <= Decimal::ZERO || trade.max_buy_fraction > Decimal::ONE {
            errors.push(format!(
                "max_buy_fraction must be in (0, 1]: {}",
                trade.max_buy_fraction
            ));
        }
        if trade.slippage_tolerance < Decimal::ZERO || trade.slippage_tolerance >= Decimal::ONE {
            errors.push(format!(
                "slippage_tolerance must be in [0, 1): {}",
                trade.slippage_tolerance
            ));
        }
        if trade.stake_yield < Decimal::ZERO {
            errors.push(format!("stake_yield cannot be negative: {}", trade.stake_yield));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
