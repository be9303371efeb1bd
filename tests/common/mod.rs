#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use signalgate::domain::error::EngineError;
pub use signalgate::domain::ohlcv::OhlcvBar;
use signalgate::domain::risk::{OrderRecord, RiskLimits};
use signalgate::ports::account_port::{AccountPort, RiskLimitsPort};
use signalgate::ports::data_port::{MarketDataPort, PriceQuote};
use std::collections::HashMap;
use std::io::Write;

pub struct MockMarket {
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub prices: HashMap<String, f64>,
    pub errors: HashMap<String, String>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            prices: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarket {
    fn fetch_bars(&self, symbol: &str, _timeframe: &str, limit: usize) -> Result<Vec<OhlcvBar>, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::upstream("mock", reason.clone()));
        }
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let skip = if limit == 0 { 0 } else { bars.len().saturating_sub(limit) };
        Ok(bars[skip..].to_vec())
    }

    fn latest_price(&self, symbol: &str) -> Result<PriceQuote, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::upstream("mock", reason.clone()));
        }
        self.prices
            .get(symbol)
            .map(|&price| PriceQuote {
                symbol: symbol.to_string(),
                price,
                time: base_time(),
            })
            .ok_or_else(|| EngineError::upstream("mock", format!("no price for {symbol}")))
    }
}

/// Account port whose every read fails.
pub struct UnreachableAccounts;

impl AccountPort for UnreachableAccounts {
    fn balance(&self, _user_id: &str) -> Result<Decimal, EngineError> {
        Err(EngineError::upstream("accounts", "connection refused"))
    }

    fn open_position_count(&self, _user_id: &str) -> Result<usize, EngineError> {
        Err(EngineError::upstream("accounts", "connection refused"))
    }

    fn orders_since(&self, _user_id: &str, _since: DateTime<Utc>) -> Result<Vec<OrderRecord>, EngineError> {
        Err(EngineError::upstream("accounts", "connection refused"))
    }
}

impl RiskLimitsPort for UnreachableAccounts {
    fn risk_limits(&self, _user_id: &str) -> Result<Option<RiskLimits>, EngineError> {
        Ok(None)
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
}

/// One bar per minute with a 1% high/low envelope around each close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            open_time: base_time() + Duration::minutes(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0 + (i % 7) as f64 * 100.0,
        })
        .collect()
}

pub fn trending_closes(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Deterministic oscillation around `center`.
pub fn zigzag_closes(count: usize, center: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| center + amplitude * ((i as f64) * 0.7).sin())
        .collect()
}

pub fn bars_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("open_time,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.open_time.to_rfc3339(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
