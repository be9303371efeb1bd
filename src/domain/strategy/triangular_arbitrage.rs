//! Triangular arbitrage across three currency pairs.
//!
//! For legs A/Q, B/A and B/Q (default BTCUSDT, ETHBTC, ETHUSDT) with prices
//! p1, p2, p3, one unit of the quote currency returns `p3 / (p1·p2)` going
//! forward (Q→A→B→Q) and `p1·p2 / p3` in reverse. Each direction pays the
//! taker fee three times.

use serde::Serialize;
use tracing::warn;

use crate::domain::config_validation::{read_non_negative, read_positive, read_string};
use crate::domain::error::EngineError;
use crate::domain::signal::Signal;
use crate::domain::strategy::{EvaluationContext, Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "triangular-arbitrage";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageConfig {
    pub legs: [String; 3],
    /// Minimum loop profit in percent.
    pub min_profit_threshold: f64,
    /// Fee per leg as a fraction.
    pub fee: f64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            legs: ["BTCUSDT".to_string(), "ETHBTC".to_string(), "ETHUSDT".to_string()],
            min_profit_threshold: 0.5,
            fee: 0.0,
        }
    }
}

impl ArbitrageConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let [first, second, third] = d.legs;
        let cfg = Self {
            legs: [
                read_string(config, SECTION, "first_pair")?.unwrap_or(first),
                read_string(config, SECTION, "second_pair")?.unwrap_or(second),
                read_string(config, SECTION, "third_pair")?.unwrap_or(third),
            ],
            min_profit_threshold: read_positive(config, SECTION, "min_profit_threshold", d.min_profit_threshold)?,
            fee: read_non_negative(config, SECTION, "fee", d.fee)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.legs.iter().any(|leg| leg.trim().is_empty()) {
            return Err(EngineError::config_invalid(SECTION, "first_pair", "all three pairs are required"));
        }
        if !(self.min_profit_threshold > 0.0 && self.min_profit_threshold.is_finite()) {
            return Err(EngineError::config_invalid(
                SECTION,
                "min_profit_threshold",
                "min_profit_threshold must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.fee) {
            return Err(EngineError::config_invalid(SECTION, "fee", "fee must be in [0, 1)"));
        }
        Ok(())
    }
}

/// Net return factors of one loop in each direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopFactors {
    pub forward: f64,
    pub reverse: f64,
}

impl LoopFactors {
    pub fn new(p1: f64, p2: f64, p3: f64, fee: f64) -> Self {
        let fee_factor = (1.0 - fee).powi(3);
        Self {
            forward: p3 / (p1 * p2) * fee_factor,
            reverse: p1 * p2 / p3 * fee_factor,
        }
    }

    /// Best direction and its profit in percent.
    pub fn best(&self) -> (&'static str, f64) {
        if self.forward >= self.reverse {
            ("forward", (self.forward - 1.0) * 100.0)
        } else {
            ("reverse", (self.reverse - 1.0) * 100.0)
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriangularArbitrage {
    config: ArbitrageConfig,
}

impl TriangularArbitrage {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self { config }
    }
}

impl Strategy for TriangularArbitrage {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TriangularArbitrage
    }

    // prices come from the market port, not from bars
    fn min_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        let Some(market) = ctx.market else {
            return Ok(ctx.hold("no market data source for arbitrage legs"));
        };

        let mut prices = [0.0; 3];
        for (slot, leg) in prices.iter_mut().zip(&self.config.legs) {
            match market.latest_price(leg) {
                Ok(quote) if quote.price > 0.0 && quote.price.is_finite() => *slot = quote.price,
                Ok(quote) => {
                    warn!(leg = %leg, price = quote.price, "unusable arbitrage leg price");
                    return Ok(ctx.hold(format!("invalid price {} for {}", quote.price, leg)));
                }
                Err(e) => {
                    warn!(leg = %leg, error = %e, "arbitrage leg price unavailable");
                    return Ok(ctx.hold(format!("price unavailable for {}: {}", leg, e)));
                }
            }
        }
        let [p1, p2, p3] = prices;

        let factors = LoopFactors::new(p1, p2, p3, self.config.fee);
        let (direction, profit_pct) = factors.best();
        let threshold = self.config.min_profit_threshold;
        let [first, second, third] = &self.config.legs;

        let signal = if profit_pct > threshold {
            let confidence = (0.7 + 0.05 * profit_pct / threshold).min(0.95);
            Signal::arbitrage(
                ctx.symbol,
                ctx.as_of,
                p1,
                confidence,
                format!(
                    "{} loop {} → {} → {} yields {:.4}%",
                    direction, first, second, third, profit_pct
                ),
            )
        } else {
            Signal::hold(
                ctx.symbol,
                ctx.as_of,
                p1,
                format!("best loop {:.4}% below threshold {}%", profit_pct, threshold),
            )
        };

        Ok(signal
            .with_indicator("forward_factor", factors.forward)
            .with_indicator("reverse_factor", factors.reverse)
            .with_indicator("profit_pct", profit_pct))
    }
}
