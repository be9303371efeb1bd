//! Mean reversion: z-score of the close against its rolling mean, confirmed by RSI.

use serde::Serialize;

use crate::domain::config_validation::{read_period, read_positive};
use crate::domain::error::EngineError;
use crate::domain::indicator::calculate_rsi;
use crate::domain::indicator::stddev::mean_and_stddev;
use crate::domain::signal::{RiskPercentages, Signal};
use crate::domain::strategy::scalping::rsi_reason;
use crate::domain::strategy::votes::{Ballot, ConfidenceTable, Vote};
use crate::domain::strategy::{
    check_band, check_period, check_risk, read_band, read_risk, EvaluationContext, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "mean-reversion";
const CONFIDENCE: ConfidenceTable = ConfidenceTable::new(0.65, 0.85, 0.90);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanReversionConfig {
    pub lookback: usize,
    pub z_threshold: f64,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub risk: RiskPercentages,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            z_threshold: 2.0,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            risk: RiskPercentages::new(2.0, 3.0),
        }
    }
}

impl MeanReversionConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let (rsi_oversold, rsi_overbought) = read_band(
            config,
            SECTION,
            "rsi_oversold",
            "rsi_overbought",
            (d.rsi_oversold, d.rsi_overbought),
        )?;
        let cfg = Self {
            lookback: read_period(config, SECTION, "lookback", d.lookback)?,
            z_threshold: read_positive(config, SECTION, "z_threshold", d.z_threshold)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            rsi_oversold,
            rsi_overbought,
            risk: read_risk(config, SECTION, d.risk)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        // a z-score needs at least two observations
        if self.lookback < 2 {
            return Err(EngineError::config_invalid(SECTION, "lookback", "lookback must be at least 2"));
        }
        check_period(SECTION, "rsi_period", self.rsi_period)?;
        if !(self.z_threshold > 0.0 && self.z_threshold.is_finite()) {
            return Err(EngineError::config_invalid(SECTION, "z_threshold", "z_threshold must be positive"));
        }
        check_band(SECTION, "rsi_oversold", self.rsi_oversold, self.rsi_overbought)?;
        check_risk(SECTION, &self.risk)
    }
}

#[derive(Debug, Clone)]
pub struct MeanReversion {
    config: MeanReversionConfig,
}

impl MeanReversion {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }
}

/// (close − mean) / σ over `window`; `None` when the window has no variance.
pub fn z_score(window: &[f64]) -> Option<f64> {
    let close = *window.last()?;
    let (mean, stddev) = mean_and_stddev(window);
    (stddev > 0.0).then(|| (close - mean) / stddev)
}

impl Strategy for MeanReversion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
    }

    fn min_bars(&self) -> usize {
        self.config.lookback.max(self.config.rsi_period + 1)
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        if ctx.bars.len() < self.min_bars() {
            return Ok(ctx.insufficient_data());
        }
        let c = &self.config;
        let last = ctx.bars.len() - 1;

        let window: Vec<f64> = ctx.bars[ctx.bars.len() - c.lookback..]
            .iter()
            .map(|b| b.close)
            .collect();
        let z = z_score(&window);
        let rsi_now = calculate_rsi(ctx.bars, c.rsi_period)?.simple_at(last);

        let mut ballot = Ballot::new();
        match z {
            Some(z) if z <= -c.z_threshold => {
                ballot.cast(Vote::Bullish, format!("price {:.2} standard deviations below mean", -z))
            }
            Some(z) if z >= c.z_threshold => {
                ballot.cast(Vote::Bearish, format!("price {:.2} standard deviations above mean", z))
            }
            Some(_) => ballot.cast(Vote::Neutral, "price near its mean"),
            None => ballot.cast(Vote::Neutral, "no price dispersion"),
        }

        let rsi_vote = Vote::from_band(rsi_now, c.rsi_oversold, c.rsi_overbought);
        ballot.cast(rsi_vote, rsi_reason(c.rsi_period, rsi_now, rsi_vote));

        let signal = ctx
            .signal_from(ballot.decide(&CONFIDENCE), &c.risk)
            .with_reading("z_score", z)
            .with_reading("rsi", rsi_now);
        Ok(signal)
    }
}
