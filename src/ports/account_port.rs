//! Account state and per-user risk limits consumed by the risk gate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::error::EngineError;
use crate::domain::risk::{OrderRecord, RiskLimits};

pub trait AccountPort: Send + Sync {
    fn balance(&self, user_id: &str) -> Result<Decimal, EngineError>;

    fn open_position_count(&self, user_id: &str) -> Result<usize, EngineError>;

    /// Orders created at or after `since`.
    fn orders_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<OrderRecord>, EngineError>;
}

pub trait RiskLimitsPort: Send + Sync {
    /// `None` when the user has no stored limits.
    fn risk_limits(&self, user_id: &str) -> Result<Option<RiskLimits>, EngineError>;
}
