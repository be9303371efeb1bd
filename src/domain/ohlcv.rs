//! OHLCV bar and validated bar series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::domain::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Checks positive prices, the OHLC envelope and volume sign. Returns the
    /// violated rule.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err("non-finite value".to_string());
        }
        if [self.open, self.high, self.low, self.close].iter().any(|&p| p <= 0.0) {
            return Err("prices must be positive".to_string());
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!("high {} below open/close", self.high));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!("low {} above open/close", self.low));
        }
        if self.volume < 0.0 {
            return Err(format!("negative volume {}", self.volume));
        }
        Ok(())
    }
}

/// Ordered bars for one symbol, strictly increasing in `open_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, EngineError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate()
                .map_err(|reason| EngineError::InvalidBar { index, reason })?;
            if index > 0 && bar.open_time <= bars[index - 1].open_time {
                return Err(EngineError::InvalidBar {
                    index,
                    reason: format!(
                        "open_time {} not after previous {}",
                        bar.open_time,
                        bars[index - 1].open_time
                    ),
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

impl Deref for BarSeries {
    type Target = [OhlcvBar];

    fn deref(&self) -> &Self::Target {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            open_time: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    fn bar_at(minute: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            open_time: Utc.with_ymd_and_hms(2024, 1, 15, 9, minute, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut bar = sample_bar();
        bar.high = 80.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_prices() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        assert_eq!(bar.validate().unwrap_err(), "prices must be positive");

        let negative = OhlcvBar {
            open: -5.0,
            high: -1.0,
            low: -6.0,
            close: -2.0,
            ..sample_bar()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_volume() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(bar.validate().unwrap_err().contains("negative volume"));
    }

    #[test]
    fn series_accepts_increasing_times() {
        let series = BarSeries::new("BTCUSDT", vec![bar_at(0, 10.0), bar_at(1, 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "BTCUSDT");
        assert_eq!(series.closes(), vec![10.0, 11.0]);
    }

    #[test]
    fn series_rejects_duplicate_time() {
        let err = BarSeries::new("X", vec![bar_at(0, 10.0), bar_at(0, 11.0)]).unwrap_err();
        match err {
            EngineError::InvalidBar { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn series_rejects_invalid_bar() {
        let mut bad = bar_at(1, 10.0);
        bad.low = 12.0;
        let err = BarSeries::new("X", vec![bar_at(0, 10.0), bad]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidBar { index: 1, .. }));
    }
}
