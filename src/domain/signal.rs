//! Trading signal emitted by a strategy.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
    Arbitrage,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
            Action::Arbitrage => "ARBITRAGE",
        };
        write!(f, "{}", s)
    }
}

/// Protective price levels attached to directional signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Stop-loss and take-profit distances in percent of the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskPercentages {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl RiskPercentages {
    pub const fn new(stop_loss_pct: f64, take_profit_pct: f64) -> Self {
        Self {
            stop_loss_pct,
            take_profit_pct,
        }
    }

    /// Levels on the protective side of `price`; `None` for non-directional actions.
    pub fn levels_for(&self, action: Action, price: f64) -> Option<RiskLevels> {
        let sl = self.stop_loss_pct / 100.0;
        let tp = self.take_profit_pct / 100.0;
        match action {
            Action::Buy => Some(RiskLevels {
                stop_loss: price * (1.0 - sl),
                take_profit: price * (1.0 + tp),
            }),
            Action::Sell => Some(RiskLevels {
                stop_loss: price * (1.0 + sl),
                take_profit: price * (1.0 - tp),
            }),
            Action::Hold | Action::Arbitrage => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub action: Action,
    pub confidence: f64,
    pub reason: String,
    pub indicators: BTreeMap<String, f64>,
    pub risk_management: Option<RiskLevels>,
}

pub const INSUFFICIENT_DATA: &str = "Insufficient data";

impl Signal {
    pub fn hold(symbol: &str, timestamp: DateTime<Utc>, price: f64, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            price,
            action: Action::Hold,
            confidence: 0.0,
            reason: reason.into(),
            indicators: BTreeMap::new(),
            risk_management: None,
        }
    }

    pub fn insufficient_data(symbol: &str, timestamp: DateTime<Utc>, price: f64) -> Self {
        Self::hold(symbol, timestamp, price, INSUFFICIENT_DATA)
    }

    /// BUY or SELL with levels derived from `risk`. Any other action yields a
    /// signal without protective levels.
    pub fn directional(
        symbol: &str,
        timestamp: DateTime<Utc>,
        price: f64,
        action: Action,
        confidence: f64,
        reason: impl Into<String>,
        risk: &RiskPercentages,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            price,
            action,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            indicators: BTreeMap::new(),
            risk_management: risk.levels_for(action, price),
        }
    }

    pub fn arbitrage(
        symbol: &str,
        timestamp: DateTime<Utc>,
        price: f64,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Arbitrage,
            confidence: confidence.clamp(0.0, 1.0),
            ..Self::hold(symbol, timestamp, price, reason)
        }
    }

    /// Records an indicator reading that informed the decision.
    pub fn with_indicator(mut self, name: &str, value: f64) -> Self {
        self.indicators.insert(name.to_string(), value);
        self
    }

    /// Like [`Signal::with_indicator`] but skips readings still in warm-up.
    pub fn with_reading(self, name: &str, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.with_indicator(name, v),
            None => self,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.action != Action::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn buy_levels_bracket_price() {
        let risk = RiskPercentages::new(1.0, 2.0);
        let signal = Signal::directional("BTCUSDT", ts(), 100.0, Action::Buy, 0.8, "test", &risk);
        let levels = signal.risk_management.unwrap();
        assert!((levels.stop_loss - 99.0).abs() < 1e-9);
        assert!((levels.take_profit - 102.0).abs() < 1e-9);
    }

    #[test]
    fn sell_levels_are_inverted() {
        let risk = RiskPercentages::new(1.0, 2.0);
        let signal = Signal::directional("BTCUSDT", ts(), 100.0, Action::Sell, 0.8, "test", &risk);
        let levels = signal.risk_management.unwrap();
        assert!(levels.stop_loss > 100.0);
        assert!(levels.take_profit < 100.0);
    }

    #[test]
    fn hold_has_no_levels() {
        let signal = Signal::hold("X", ts(), 10.0, "flat");
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.confidence, 0.0);
        assert!(signal.risk_management.is_none());
        assert!(!signal.is_actionable());
    }

    #[test]
    fn insufficient_data_reason() {
        let signal = Signal::insufficient_data("X", ts(), 0.0);
        assert_eq!(signal.reason, "Insufficient data");
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn confidence_is_clamped() {
        let risk = RiskPercentages::new(1.0, 2.0);
        let signal = Signal::directional("X", ts(), 1.0, Action::Buy, 1.7, "test", &risk);
        assert_eq!(signal.confidence, 1.0);
    }

    #[test]
    fn arbitrage_has_no_levels() {
        let signal = Signal::arbitrage("BTCUSDT", ts(), 30000.0, 0.9, "loop");
        assert_eq!(signal.action, Action::Arbitrage);
        assert!(signal.risk_management.is_none());
        assert!(signal.is_actionable());
    }

    #[test]
    fn missing_reading_is_skipped() {
        let signal = Signal::hold("X", ts(), 10.0, "flat")
            .with_reading("rsi", Some(55.0))
            .with_reading("sma", None);
        assert_eq!(signal.indicators.len(), 1);
        assert_eq!(signal.indicators.get("rsi"), Some(&55.0));
    }

    #[test]
    fn action_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Action::Arbitrage).unwrap(), "\"ARBITRAGE\"");
        assert_eq!(Action::Buy.to_string(), "BUY");
    }
}
