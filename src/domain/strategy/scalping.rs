//! Scalping: fast EMA crossover, short RSI and Bollinger band touches.

use serde::Serialize;

use crate::domain::config_validation::{read_period, read_positive};
use crate::domain::error::EngineError;
use crate::domain::indicator::{calculate_bollinger, calculate_ema, calculate_rsi, IndicatorValue};
use crate::domain::signal::{RiskPercentages, Signal};
use crate::domain::strategy::votes::{Ballot, ConfidenceTable, Vote};
use crate::domain::strategy::{
    check_band, check_period, check_risk, read_band, read_risk, EvaluationContext, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "scalping";
const CONFIDENCE: ConfidenceTable = ConfidenceTable::new(0.60, 0.80, 0.90);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalpingConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bb_period: usize,
    pub bb_multiplier: f64,
    pub risk: RiskPercentages,
}

impl Default for ScalpingConfig {
    fn default() -> Self {
        Self {
            ema_fast: 5,
            ema_slow: 13,
            rsi_period: 7,
            rsi_oversold: 25.0,
            rsi_overbought: 75.0,
            bb_period: 20,
            bb_multiplier: 2.0,
            risk: RiskPercentages::new(0.5, 1.0),
        }
    }
}

impl ScalpingConfig {
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
            ema_fast: read_period(config, SECTION, "ema_fast", d.ema_fast)?,
            ema_slow: read_period(config, SECTION, "ema_slow", d.ema_slow)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            rsi_oversold,
            rsi_overbought,
            bb_period: read_period(config, SECTION, "bb_period", d.bb_period)?,
            bb_multiplier: read_positive(config, SECTION, "bb_multiplier", d.bb_multiplier)?,
            risk: read_risk(config, SECTION, d.risk)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_period(SECTION, "ema_fast", self.ema_fast)?;
        check_period(SECTION, "rsi_period", self.rsi_period)?;
        check_period(SECTION, "bb_period", self.bb_period)?;
        if self.ema_fast >= self.ema_slow {
            return Err(EngineError::config_invalid(
                SECTION,
                "ema_fast",
                format!("ema_fast {} must be below ema_slow {}", self.ema_fast, self.ema_slow),
            ));
        }
        if !(self.bb_multiplier > 0.0 && self.bb_multiplier.is_finite()) {
            return Err(EngineError::config_invalid(SECTION, "bb_multiplier", "bb_multiplier must be positive"));
        }
        check_band(SECTION, "rsi_oversold", self.rsi_oversold, self.rsi_overbought)?;
        check_risk(SECTION, &self.risk)
    }
}

#[derive(Debug, Clone)]
pub struct Scalping {
    config: ScalpingConfig,
}

impl Scalping {
    pub fn new(config: ScalpingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for Scalping {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Scalping
    }

    fn min_bars(&self) -> usize {
        // the crossover compares the last two bars of the slow EMA
        (self.config.ema_slow + 1)
            .max(self.config.rsi_period + 1)
            .max(self.config.bb_period)
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        if ctx.bars.len() < self.min_bars() {
            return Ok(ctx.insufficient_data());
        }
        let c = &self.config;
        let last = ctx.bars.len() - 1;
        let close = ctx.bars[last].close;

        let fast = calculate_ema(ctx.bars, c.ema_fast)?;
        let slow = calculate_ema(ctx.bars, c.ema_slow)?;
        let rsi = calculate_rsi(ctx.bars, c.rsi_period)?;
        let bands = calculate_bollinger(ctx.bars, c.bb_period, c.bb_multiplier)?;

        let mut ballot = Ballot::new();

        let cross = (
            fast.simple_at(last - 1),
            slow.simple_at(last - 1),
            fast.simple_at(last),
            slow.simple_at(last),
        );
        match cross {
            (Some(pf), Some(ps), Some(f), Some(s)) if pf <= ps && f > s => ballot.cast(
                Vote::Bullish,
                format!("EMA({}) crossed above EMA({})", c.ema_fast, c.ema_slow),
            ),
            (Some(pf), Some(ps), Some(f), Some(s)) if pf >= ps && f < s => ballot.cast(
                Vote::Bearish,
                format!("EMA({}) crossed below EMA({})", c.ema_fast, c.ema_slow),
            ),
            _ => ballot.cast(Vote::Neutral, "no EMA crossover"),
        }

        let rsi_now = rsi.simple_at(last);
        let rsi_vote = Vote::from_band(rsi_now, c.rsi_oversold, c.rsi_overbought);
        ballot.cast(rsi_vote, rsi_reason(c.rsi_period, rsi_now, rsi_vote));

        let (upper, lower) = match bands.value_at(last) {
            Some(IndicatorValue::Bollinger { upper, lower, .. }) => (Some(upper), Some(lower)),
            _ => (None, None),
        };
        // zero-width bands (no variance) carry no information
        match (upper, lower) {
            (Some(hi), Some(lo)) if hi > lo && close <= lo => {
                ballot.cast(Vote::Bullish, "close at or below lower Bollinger band")
            }
            (Some(hi), Some(lo)) if hi > lo && close >= hi => {
                ballot.cast(Vote::Bearish, "close at or above upper Bollinger band")
            }
            _ => ballot.cast(Vote::Neutral, "close inside Bollinger bands"),
        }

        let signal = ctx
            .signal_from(ballot.decide(&CONFIDENCE), &c.risk)
            .with_reading("ema_fast", fast.simple_at(last))
            .with_reading("ema_slow", slow.simple_at(last))
            .with_reading("rsi", rsi_now)
            .with_reading("bb_upper", upper)
            .with_reading("bb_lower", lower);
        Ok(signal)
    }
}

/// Human-readable cause for an RSI vote.
pub(crate) fn rsi_reason(period: usize, value: Option<f64>, vote: Vote) -> String {
    match (value, vote) {
        (Some(v), Vote::Bullish) => format!("RSI({}) oversold at {:.1}", period, v),
        (Some(v), Vote::Bearish) => format!("RSI({}) overbought at {:.1}", period, v),
        (Some(v), Vote::Neutral) => format!("RSI({}) neutral at {:.1}", period, v),
        (None, _) => format!("RSI({}) unavailable", period),
    }
}
