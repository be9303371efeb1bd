use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(EngineError::invalid_parameter(
                "order",
                format!("unknown side '{other}', expected buy or sell"),
            )),
        }
    }
}

/// An order awaiting a risk verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    /// `None` means unlevered.
    pub leverage: Option<Decimal>,
}

impl CandidateOrder {
    pub fn new(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            leverage: None,
        }
    }

    pub fn with_leverage(mut self, leverage: Decimal) -> Self {
        self.leverage = Some(leverage);
        self
    }

    /// `quantity * price`, or `None` when the product does not fit a `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.price)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::invalid_parameter("order", "symbol must not be empty"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(EngineError::invalid_parameter(
                "order",
                format!("quantity must be positive, got {}", self.quantity),
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(EngineError::invalid_parameter(
                "order",
                format!("price must be positive, got {}", self.price),
            ));
        }
        if self.notional().is_none() {
            return Err(EngineError::invalid_parameter(
                "order",
                format!("notional {} x {} is out of range", self.quantity, self.price),
            ));
        }
        if let Some(leverage) = self.leverage {
            if leverage <= Decimal::ZERO {
                return Err(EngineError::invalid_parameter(
                    "order",
                    format!("leverage must be positive, got {leverage}"),
                ));
            }
        }
        Ok(())
    }
}

/// A past order with its realized profit or loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub created_at: DateTime<Utc>,
    pub symbol: String,
    pub realized_pnl: Decimal,
}

/// Acknowledgement from the submission port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub user_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub submitted_at: DateTime<Utc>,
}
