//! Market data port.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;

/// Most recent traded price for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub time: DateTime<Utc>,
}

pub trait MarketDataPort: Send + Sync {
    /// Up to `limit` most recent bars, oldest first.
    fn fetch_bars(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<OhlcvBar>, EngineError>;

    fn latest_price(&self, symbol: &str) -> Result<PriceQuote, EngineError>;
}
