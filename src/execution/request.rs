//! Trade Request Builder
//!
//! Assembles the contract call for a trade: target function, Clarity
//! arguments and a single fungible post-condition on the settlement token.
//! Building is pure; submission belongs to the [`ContractCaller`].
//!
//! [`ContractCaller`]: crate::adapters::ContractCaller

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{AppConfig, ContractConfig, PostConditionFloor, TokenConfig, TransferBasis};
use crate::domain::{Asset, TradeDirection, TradeQuantities};
use crate::error::{Result, ThetixError};
use crate::validation::validate_principal;

pub const PURCHASE_FUNCTION: &str = "purchase-asset";
pub const SELL_FUNCTION: &str = "sell-asset";
pub const PAUSE_FUNCTION: &str = "pause-contract";
pub const UNPAUSE_FUNCTION: &str = "unpause-contract";
pub const EMERGENCY_WITHDRAW_FUNCTION: &str = "emergency-withdraw";
pub const IS_PAUSED_FUNCTION: &str = "is-paused";

/// Clarity value passed as a function argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ClarityValue {
    UInt(u128),
    Bool(bool),
    Principal(String),
}

impl fmt::Display for ClarityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClarityValue::UInt(v) => write!(f, "u{}", v),
            ClarityValue::Bool(v) => write!(f, "{}", v),
            ClarityValue::Principal(p) => write!(f, "'{}", p),
        }
    }
}

/// Comparison applied by a fungible post-condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FungibleConditionCode {
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

/// Who the post-condition constrains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostConditionPrincipal {
    /// A user account
    Standard { address: String },
    /// A deployed contract
    Contract { address: String, name: String },
}

/// "`principal` transfers `code` `amount` of `asset`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungiblePostCondition {
    pub principal: PostConditionPrincipal,
    pub code: FungibleConditionCode,
    pub amount: u128,
    pub asset: TokenConfig,
}

/// Whether transfers not covered by a post-condition abort the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostConditionMode {
    Allow,
    Deny,
}

/// A contract call ready to hand to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
    pub post_conditions: Vec<FungiblePostCondition>,
    pub post_condition_mode: PostConditionMode,
}

impl TradeRequest {
    /// `address.contract::function`
    pub fn target(&self) -> String {
        format!(
            "{}.{}::{}",
            self.contract_address, self.contract_name, self.function_name
        )
    }
}

/// A read-only contract query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOnlyCall {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
    pub sender: String,
}

/// Administrative calls on the settlement contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Pause,
    Unpause,
    EmergencyWithdraw { amount: u128, recipient: String },
}

pub struct TradeRequestBuilder {
    contract: ContractConfig,
    sender: String,
    floor: PostConditionFloor,
    basis: TransferBasis,
}

impl TradeRequestBuilder {
    /// Create a builder for requests signed by `sender`
    pub fn new(contract: ContractConfig, sender: impl Into<String>) -> Result<Self> {
        let sender = sender.into();
        validate_principal(&sender)?;
        validate_principal(&contract.address)?;

        Ok(Self {
            contract,
            sender,
            floor: PostConditionFloor::default(),
            basis: TransferBasis::default(),
        })
    }

    pub fn from_config(config: &AppConfig, sender: impl Into<String>) -> Result<Self> {
        Ok(Self::new(config.contract.clone(), sender)?
            .with_floor(config.trade.post_condition_floor)
            .with_transfer_basis(config.trade.transfer_basis))
    }

    pub fn with_floor(mut self, floor: PostConditionFloor) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_transfer_basis(mut self, basis: TransferBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Build a trade call from raw base-unit quantities.
    ///
    /// Both quantities must be non-negative integers; anything else fails with
    /// `InvalidQuantity` and no request is produced.
    pub fn build_trade_request(
        &self,
        direction: TradeDirection,
        asset: &Asset,
        quantity_base_units: Decimal,
        expected_settlement_base_units: Decimal,
    ) -> Result<TradeRequest> {
        let quantity = integral_units(quantity_base_units, "quantity")?;
        let expected = integral_units(expected_settlement_base_units, "expected settlement")?;
        Ok(self.trade_call(direction, asset, quantity, expected))
    }

    /// Build a trade call from computed quantities, honoring the transfer basis
    pub fn build_from_quantities(
        &self,
        asset: &Asset,
        quantities: &TradeQuantities,
    ) -> Result<TradeRequest> {
        let quantity = match self.basis {
            TransferBasis::Gross => quantities.transfer_base_units,
            TransferBasis::Net => quantities.net_transfer_base_units,
        };
        let expected = match quantities.direction {
            TradeDirection::Buy => quantity,
            TradeDirection::Sell => quantities.expected_settlement_base_units,
        };
        Ok(self.trade_call(quantities.direction, asset, quantity, expected))
    }

    /// Build an administrative call on the settlement contract
    pub fn build_admin_request(&self, action: AdminAction) -> Result<TradeRequest> {
        let (function_name, function_args) = match action {
            AdminAction::Pause => (PAUSE_FUNCTION, vec![]),
            AdminAction::Unpause => (UNPAUSE_FUNCTION, vec![]),
            AdminAction::EmergencyWithdraw { amount, recipient } => {
                validate_principal(&recipient)?;
                (
                    EMERGENCY_WITHDRAW_FUNCTION,
                    vec![ClarityValue::UInt(amount), ClarityValue::Principal(recipient)],
                )
            }
        };

        let token = &self.contract.settlement_token;
        Ok(TradeRequest {
            contract_address: token.contract_address.clone(),
            contract_name: token.contract_name.clone(),
            function_name: function_name.to_string(),
            function_args,
            post_conditions: vec![],
            post_condition_mode: PostConditionMode::Allow,
        })
    }

    /// Read-only `is-paused` query on the settlement contract
    pub fn is_paused_call(&self) -> ReadOnlyCall {
        let token = &self.contract.settlement_token;
        ReadOnlyCall {
            contract_address: token.contract_address.clone(),
            contract_name: token.contract_name.clone(),
            function_name: IS_PAUSED_FUNCTION.to_string(),
            function_args: vec![],
            sender: self.sender.clone(),
        }
    }

    fn trade_call(
        &self,
        direction: TradeDirection,
        asset: &Asset,
        quantity: u128,
        expected_settlement: u128,
    ) -> TradeRequest {
        let (function_name, principal) = match direction {
            TradeDirection::Buy => (
                PURCHASE_FUNCTION,
                PostConditionPrincipal::Standard {
                    address: self.sender.clone(),
                },
            ),
            TradeDirection::Sell => (
                SELL_FUNCTION,
                PostConditionPrincipal::Contract {
                    address: self.contract.address.clone(),
                    name: self.contract.name.clone(),
                },
            ),
        };

        let amount = match self.floor {
            PostConditionFloor::ExpectedSettlement => expected_settlement,
            PostConditionFloor::Zero => 0,
        };

        let request = TradeRequest {
            contract_address: self.contract.address.clone(),
            contract_name: self.contract.name.clone(),
            function_name: function_name.to_string(),
            function_args: vec![
                ClarityValue::UInt(u128::from(asset.key.value())),
                ClarityValue::UInt(quantity),
            ],
            post_conditions: vec![FungiblePostCondition {
                principal,
                code: FungibleConditionCode::GreaterEqual,
                amount,
                asset: self.contract.settlement_token.clone(),
            }],
            post_condition_mode: PostConditionMode::Deny,
        };

        debug!(
            target_fn = %request.target(),
            asset = %asset.ticker,
            quantity,
            post_condition_amount = amount,
            "built trade request"
        );
        request
    }
}

fn integral_units(value: Decimal, what: &str) -> Result<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ThetixError::InvalidQuantity(format!(
            "{} cannot be negative: {}",
            what, value
        )));
    }
    if !value.fract().is_zero() {
        return Err(ThetixError::InvalidQuantity(format!(
            "{} must be whole base units: {}",
            what, value
        )));
    }
    value
        .to_u128()
        .ok_or_else(|| ThetixError::InvalidQuantity(format!("{} out of range: {}", what, value)))
}
