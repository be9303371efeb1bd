//! Fractional-Kelly position sizing from realized trade statistics.
//!
//! f* = (p·b − q) / b, where p is the win rate, q = 1 − p and b the ratio of
//! average win to average loss. The raw fraction is scaled by
//! `kelly_fraction` and clamped to `[min_fraction, max_fraction]`. Inputs that
//! cannot support an estimate fall back to `default_fraction`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::warn;

use crate::domain::config_validation::{read_fraction, read_period, read_positive};
use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "sizing";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellyConfig {
    pub kelly_fraction: f64,
    pub min_fraction: f64,
    pub max_fraction: f64,
    pub default_fraction: f64,
    pub min_trades: usize,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.25,
            min_fraction: 0.005,
            max_fraction: 0.05,
            default_fraction: 0.01,
            min_trades: 20,
        }
    }
}

impl KellyConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let cfg = Self {
            kelly_fraction: read_positive(config, SECTION, "kelly_fraction", d.kelly_fraction)?,
            min_fraction: read_fraction(config, SECTION, "min_fraction", d.min_fraction)?,
            max_fraction: read_fraction(config, SECTION, "max_fraction", d.max_fraction)?,
            default_fraction: read_fraction(config, SECTION, "default_fraction", d.default_fraction)?,
            min_trades: read_period(config, SECTION, "min_trades", d.min_trades)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(EngineError::config_invalid(
                SECTION,
                "kelly_fraction",
                "kelly_fraction must be in (0, 1]",
            ));
        }
        if self.min_fraction > self.max_fraction {
            return Err(EngineError::config_invalid(
                SECTION,
                "min_fraction",
                format!(
                    "min_fraction {} exceeds max_fraction {}",
                    self.min_fraction, self.max_fraction
                ),
            ));
        }
        if !(self.min_fraction..=self.max_fraction).contains(&self.default_fraction) {
            return Err(EngineError::config_invalid(
                SECTION,
                "default_fraction",
                "default_fraction must lie between min_fraction and max_fraction",
            ));
        }
        Ok(())
    }

    pub fn recommend(&self, stats: &TradeStats) -> SizeRecommendation {
        if stats.trades < self.min_trades {
            return self.fallback(format!("{} trades, need at least {}", stats.trades, self.min_trades));
        }
        if !(stats.win_rate > 0.0 && stats.win_rate < 1.0) {
            return self.fallback(format!("win rate {} outside (0, 1)", stats.win_rate));
        }
        if !(stats.avg_win > 0.0 && stats.avg_loss > 0.0) {
            return self.fallback(format!(
                "average win {} and average loss {} must both be positive",
                stats.avg_win, stats.avg_loss
            ));
        }

        let p = stats.win_rate;
        let q = 1.0 - p;
        let b = stats.avg_win / stats.avg_loss;
        let kelly = (p * b - q) / b;
        let scaled = kelly * self.kelly_fraction;
        if !scaled.is_finite() {
            return self.fallback(format!("non-finite Kelly fraction {kelly}"));
        }

        SizeRecommendation {
            fraction: scaled.clamp(self.min_fraction, self.max_fraction),
            kelly: Some(kelly),
            fallback: None,
        }
    }

    fn fallback(&self, reason: String) -> SizeRecommendation {
        warn!(reason = %reason, fraction = self.default_fraction, "Kelly sizing fell back to default");
        SizeRecommendation {
            fraction: self.default_fraction,
            kelly: None,
            fallback: Some(reason),
        }
    }
}

/// Win/loss statistics over a trade history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeStats {
    pub trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Magnitude of the average losing trade.
    pub avg_loss: f64,
}

impl TradeStats {
    /// Break-even trades count toward `trades` but neither side.
    pub fn from_pnls(pnls: &[Decimal]) -> Self {
        let wins: Vec<f64> = pnls
            .iter()
            .filter(|p| **p > Decimal::ZERO)
            .filter_map(|p| p.to_f64())
            .collect();
        let losses: Vec<f64> = pnls
            .iter()
            .filter(|p| **p < Decimal::ZERO)
            .filter_map(|p| p.to_f64())
            .map(f64::abs)
            .collect();
        let average = |xs: &[f64]| {
            if xs.is_empty() {
                0.0
            } else {
                xs.iter().sum::<f64>() / xs.len() as f64
            }
        };
        Self {
            trades: pnls.len(),
            win_rate: if pnls.is_empty() {
                0.0
            } else {
                wins.len() as f64 / pnls.len() as f64
            },
            avg_win: average(&wins),
            avg_loss: average(&losses),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeRecommendation {
    /// Fraction of balance to commit.
    pub fraction: f64,
    /// Unscaled Kelly estimate, absent on fallback.
    pub kelly: Option<f64>,
    pub fallback: Option<String>,
}

impl SizeRecommendation {
    pub fn notional(&self, balance: Decimal) -> Decimal {
        balance * Decimal::try_from(self.fraction).unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn stats(trades: usize, win_rate: f64, avg_win: f64, avg_loss: f64) -> TradeStats {
        TradeStats {
            trades,
            win_rate,
            avg_win,
            avg_loss,
        }
    }

    #[test]
    fn quarter_kelly_within_band() {
        // p = 0.55, b = 1.2: f* = (0.66 − 0.45)/1.2 = 0.175, quarter = 0.04375
        let rec = KellyConfig::default().recommend(&stats(50, 0.55, 120.0, 100.0));
        assert_relative_eq!(rec.kelly.unwrap(), 0.175, epsilon = 1e-12);
        assert_relative_eq!(rec.fraction, 0.04375, epsilon = 1e-12);
        assert!(rec.fallback.is_none());
    }

    #[test]
    fn strong_edge_clamps_to_max() {
        let rec = KellyConfig::default().recommend(&stats(50, 0.7, 200.0, 100.0));
        assert_eq!(rec.fraction, 0.05);
    }

    #[test]
    fn negative_edge_clamps_to_min() {
        let rec = KellyConfig::default().recommend(&stats(50, 0.3, 100.0, 100.0));
        assert!(rec.kelly.unwrap() < 0.0);
        assert_eq!(rec.fraction, 0.005);
    }

    #[test]
    fn thin_history_falls_back() {
        let rec = KellyConfig::default().recommend(&stats(5, 0.6, 100.0, 50.0));
        assert_eq!(rec.fraction, 0.01);
        assert!(rec.fallback.unwrap().contains("5 trades"));
    }

    #[test]
    fn degenerate_inputs_fall_back() {
        let cfg = KellyConfig::default();
        assert_eq!(cfg.recommend(&stats(50, 1.0, 100.0, 50.0)).fraction, 0.01);
        assert_eq!(cfg.recommend(&stats(50, 0.0, 100.0, 50.0)).fraction, 0.01);
        assert_eq!(cfg.recommend(&stats(50, 0.5, 100.0, 0.0)).fraction, 0.01);
        assert_eq!(cfg.recommend(&stats(50, f64::NAN, 100.0, 50.0)).fraction, 0.01);
    }

    #[test]
    fn stats_from_pnls() {
        let s = TradeStats::from_pnls(&[dec!(100), dec!(-50), dec!(200), dec!(0), dec!(-150)]);
        assert_eq!(s.trades, 5);
        assert_relative_eq!(s.win_rate, 0.4);
        assert_relative_eq!(s.avg_win, 150.0);
        assert_relative_eq!(s.avg_loss, 100.0);
    }

    #[test]
    fn empty_history_is_degenerate() {
        let s = TradeStats::from_pnls(&[]);
        assert_eq!(s.trades, 0);
        assert_eq!(KellyConfig::default().recommend(&s).fraction, 0.01);
    }

    #[test]
    fn notional_scales_balance() {
        let rec = SizeRecommendation {
            fraction: 0.02,
            kelly: None,
            fallback: None,
        };
        assert_eq!(rec.notional(dec!(10000)), dec!(200));
    }

    #[test]
    fn config_rejects_inverted_band() {
        let cfg = FileConfigAdapter::from_string("[sizing]\nmin_fraction = 0.1\nmax_fraction = 0.05\n").unwrap();
        assert!(KellyConfig::from_config(&cfg).is_err());
    }
}
