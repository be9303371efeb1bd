//! CSV file market data adapter.
//!
//! Bars live in `<base>/<SYMBOL>_<timeframe>.csv` with the header
//! `open_time,open,high,low,close,volume`. `open_time` may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or epoch milliseconds, all UTC.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::risk::OrderRecord;
use crate::ports::data_port::{MarketDataPort, PriceQuote};

const SOURCE: &str = "csv";

#[derive(Debug, Deserialize)]
struct BarRow {
    open_time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
    default_timeframe: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            default_timeframe: "1h".to_string(),
        }
    }

    /// Timeframe used by `latest_price`.
    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.default_timeframe = timeframe.into();
        self
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

/// Reads every bar in one file, sorted by `open_time`.
pub fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, EngineError> {
    let content = fs::read_to_string(path)
        .map_err(|e| EngineError::upstream(SOURCE, format!("failed to read {}: {}", path.display(), e)))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();
    for (row, result) in rdr.deserialize::<BarRow>().enumerate() {
        let record =
            result.map_err(|e| EngineError::upstream(SOURCE, format!("{} row {}: {}", path.display(), row + 1, e)))?;
        let open_time = parse_time(&record.open_time).ok_or_else(|| {
            EngineError::upstream(
                SOURCE,
                format!("{} row {}: invalid open_time '{}'", path.display(), row + 1, record.open_time),
            )
        })?;
        bars.push(OhlcvBar {
            open_time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    bars.sort_by_key(|b| b.open_time);
    debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Reads `created_at,symbol,realized_pnl` order history.
pub fn read_order_history(path: &Path) -> Result<Vec<OrderRecord>, EngineError> {
    let content = fs::read_to_string(path)
        .map_err(|e| EngineError::upstream(SOURCE, format!("failed to read {}: {}", path.display(), e)))?;
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.deserialize::<OrderRecord>()
        .enumerate()
        .map(|(row, result)| {
            result.map_err(|e| EngineError::upstream(SOURCE, format!("{} row {}: {}", path.display(), row + 1, e)))
        })
        .collect()
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

impl MarketDataPort for CsvAdapter {
    /// `limit == 0` returns the whole file.
    fn fetch_bars(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<OhlcvBar>, EngineError> {
        let mut bars = read_bars(&self.csv_path(symbol, timeframe))?;
        if limit > 0 && bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Ok(bars)
    }

    fn latest_price(&self, symbol: &str) -> Result<PriceQuote, EngineError> {
        let bars = self.fetch_bars(symbol, &self.default_timeframe, 1)?;
        let last = bars
            .last()
            .ok_or_else(|| EngineError::upstream(SOURCE, format!("no bars for {symbol}")))?;
        Ok(PriceQuote {
            symbol: symbol.to_string(),
            price: last.close,
            time: last.open_time,
        })
    }
}
