//! Grid trading: symmetric buy/sell levels around a base price.
//!
//! Level `i` (1-based) sits at `base·(1 − i·spacing)` on the buy side and
//! `base·(1 + i·spacing)` on the sell side. A signal fires when the last close
//! is within `tolerance` (relative) of a level; deeper levels get more
//! confidence.

use serde::Serialize;

use crate::domain::config_validation::{read_fraction, read_period, read_positive};
use crate::domain::error::EngineError;
use crate::domain::indicator::sma::mean_of;
use crate::domain::signal::{Action, RiskPercentages, Signal};
use crate::domain::strategy::{check_period, check_risk, read_risk, EvaluationContext, Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "grid";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridConfig {
    /// Fixed base price; when absent the SMA of the last `base_period` closes.
    pub base_price: Option<f64>,
    pub base_period: usize,
    pub levels: usize,
    pub spacing: f64,
    pub tolerance: f64,
    pub risk: RiskPercentages,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_price: None,
            base_period: 20,
            levels: 5,
            spacing: 0.01,
            tolerance: 0.002,
            risk: RiskPercentages::new(2.0, 1.0),
        }
    }
}

impl GridConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let base_price = match config.get_string(SECTION, "base_price") {
            Some(_) => Some(read_positive(config, SECTION, "base_price", 0.0)?),
            None => None,
        };
        let cfg = Self {
            base_price,
            base_period: read_period(config, SECTION, "base_period", d.base_period)?,
            levels: read_period(config, SECTION, "levels", d.levels)?,
            spacing: read_fraction(config, SECTION, "spacing", d.spacing)?,
            tolerance: read_fraction(config, SECTION, "tolerance", d.tolerance)?,
            risk: read_risk(config, SECTION, d.risk)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_period(SECTION, "base_period", self.base_period)?;
        check_period(SECTION, "levels", self.levels)?;
        if let Some(base) = self.base_price {
            if !(base > 0.0 && base.is_finite()) {
                return Err(EngineError::config_invalid(SECTION, "base_price", "base_price must be positive"));
            }
        }
        if !(self.spacing > 0.0 && self.spacing < 1.0) {
            return Err(EngineError::config_invalid(SECTION, "spacing", "spacing must be between 0 and 1"));
        }
        // the deepest buy level must stay above zero
        if self.levels as f64 * self.spacing >= 1.0 {
            return Err(EngineError::config_invalid(
                SECTION,
                "levels",
                format!("levels × spacing = {} must be below 1", self.levels as f64 * self.spacing),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(EngineError::config_invalid(SECTION, "tolerance", "tolerance must be between 0 and 1"));
        }
        check_risk(SECTION, &self.risk)
    }
}

/// One rung of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridLevel {
    pub index: usize,
    pub action: Action,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct Grid {
    config: GridConfig,
}

impl Grid {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    /// All buy and sell levels around `base`, nearest first on each side.
    pub fn levels(&self, base: f64) -> Vec<GridLevel> {
        (1..=self.config.levels)
            .flat_map(|i| {
                let offset = i as f64 * self.config.spacing;
                [
                    GridLevel {
                        index: i,
                        action: Action::Buy,
                        price: base * (1.0 - offset),
                    },
                    GridLevel {
                        index: i,
                        action: Action::Sell,
                        price: base * (1.0 + offset),
                    },
                ]
            })
            .collect()
    }

    fn base_price(&self, ctx: &EvaluationContext) -> f64 {
        match self.config.base_price {
            Some(base) => base,
            None => {
                let closes: Vec<f64> = ctx.bars[ctx.bars.len() - self.config.base_period..]
                    .iter()
                    .map(|b| b.close)
                    .collect();
                mean_of(&closes)
            }
        }
    }
}

impl Strategy for Grid {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Grid
    }

    fn min_bars(&self) -> usize {
        match self.config.base_price {
            Some(_) => 1,
            None => self.config.base_period,
        }
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        if ctx.bars.len() < self.min_bars() {
            return Ok(ctx.insufficient_data());
        }
        let c = &self.config;
        let price = ctx.last_close();
        let base = self.base_price(ctx);

        let nearest = self
            .levels(base)
            .into_iter()
            .map(|level| (level, (price - level.price).abs() / level.price))
            .filter(|(_, distance)| *distance <= c.tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let signal = match nearest {
            Some((level, _)) => {
                let confidence = 0.6 + 0.3 * level.index as f64 / c.levels as f64;
                let side = if level.action == Action::Buy { "buy" } else { "sell" };
                Signal::directional(
                    ctx.symbol,
                    ctx.as_of,
                    price,
                    level.action,
                    confidence,
                    format!("price {:.2} at grid {} level {} ({:.2})", price, side, level.index, level.price),
                    &c.risk,
                )
                .with_indicator("grid_level", level.index as f64)
                .with_indicator("level_price", level.price)
            }
            None => ctx.hold(format!("price {:.2} between grid levels", price)),
        };
        Ok(signal.with_indicator("base_price", base))
    }
}
