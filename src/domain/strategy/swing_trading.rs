//! Swing trading: moving-average trend, RSI, Stochastic turns and Parabolic SAR.

use serde::Serialize;

use crate::domain::config_validation::{read_period, read_positive};
use crate::domain::error::EngineError;
use crate::domain::indicator::{
    calculate_psar, calculate_rsi, calculate_sma, calculate_stochastic, IndicatorValue,
};
use crate::domain::signal::{RiskPercentages, Signal};
use crate::domain::strategy::scalping::rsi_reason;
use crate::domain::strategy::votes::{Ballot, ConfidenceTable, Vote};
use crate::domain::strategy::{
    check_band, check_period, check_risk, read_band, read_risk, EvaluationContext, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "swing-trading";
const CONFIDENCE: ConfidenceTable = ConfidenceTable::new(0.70, 0.85, 0.90);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingTradingConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub rsi_low: f64,
    pub rsi_high: f64,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub psar_step: f64,
    pub psar_maximum: f64,
    pub risk: RiskPercentages,
}

impl Default for SwingTradingConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
            rsi_low: 40.0,
            rsi_high: 60.0,
            stoch_k: 14,
            stoch_d: 3,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            psar_step: 0.02,
            psar_maximum: 0.2,
            risk: RiskPercentages::new(3.0, 6.0),
        }
    }
}

impl SwingTradingConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let (rsi_low, rsi_high) = read_band(config, SECTION, "rsi_low", "rsi_high", (d.rsi_low, d.rsi_high))?;
        let (stoch_oversold, stoch_overbought) = read_band(
            config,
            SECTION,
            "stoch_oversold",
            "stoch_overbought",
            (d.stoch_oversold, d.stoch_overbought),
        )?;
        let cfg = Self {
            sma_short: read_period(config, SECTION, "sma_short", d.sma_short)?,
            sma_long: read_period(config, SECTION, "sma_long", d.sma_long)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            rsi_low,
            rsi_high,
            stoch_k: read_period(config, SECTION, "stoch_k", d.stoch_k)?,
            stoch_d: read_period(config, SECTION, "stoch_d", d.stoch_d)?,
            stoch_oversold,
            stoch_overbought,
            psar_step: read_positive(config, SECTION, "psar_step", d.psar_step)?,
            psar_maximum: read_positive(config, SECTION, "psar_maximum", d.psar_maximum)?,
            risk: read_risk(config, SECTION, d.risk)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_period(SECTION, "sma_short", self.sma_short)?;
        check_period(SECTION, "rsi_period", self.rsi_period)?;
        check_period(SECTION, "stoch_k", self.stoch_k)?;
        check_period(SECTION, "stoch_d", self.stoch_d)?;
        if self.sma_short >= self.sma_long {
            return Err(EngineError::config_invalid(
                SECTION,
                "sma_short",
                format!("sma_short {} must be below sma_long {}", self.sma_short, self.sma_long),
            ));
        }
        if !(self.psar_step > 0.0 && self.psar_step <= self.psar_maximum) {
            return Err(EngineError::config_invalid(
                SECTION,
                "psar_step",
                "psar_step must be positive and at most psar_maximum",
            ));
        }
        check_band(SECTION, "rsi_low", self.rsi_low, self.rsi_high)?;
        check_band(SECTION, "stoch_oversold", self.stoch_oversold, self.stoch_overbought)?;
        check_risk(SECTION, &self.risk)
    }
}

#[derive(Debug, Clone)]
pub struct SwingTrading {
    config: SwingTradingConfig,
}

impl SwingTrading {
    pub fn new(config: SwingTradingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for SwingTrading {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SwingTrading
    }

    fn min_bars(&self) -> usize {
        let c = &self.config;
        c.sma_long
            .max(c.rsi_period + 1)
            .max(c.stoch_k + c.stoch_d - 1)
            .max(2)
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        if ctx.bars.len() < self.min_bars() {
            return Ok(ctx.insufficient_data());
        }
        let c = &self.config;
        let last = ctx.bars.len() - 1;

        let short = calculate_sma(ctx.bars, c.sma_short)?.simple_at(last);
        let long = calculate_sma(ctx.bars, c.sma_long)?.simple_at(last);
        let rsi_now = calculate_rsi(ctx.bars, c.rsi_period)?.simple_at(last);
        let stoch = calculate_stochastic(ctx.bars, c.stoch_k, c.stoch_d)?.value_at(last);
        let psar = calculate_psar(ctx.bars, c.psar_step, c.psar_maximum)?.value_at(last);

        let mut ballot = Ballot::new();

        match (short, long) {
            (Some(s), Some(l)) if s > l => ballot.cast(
                Vote::Bullish,
                format!("SMA({}) above SMA({})", c.sma_short, c.sma_long),
            ),
            (Some(s), Some(l)) if s < l => ballot.cast(
                Vote::Bearish,
                format!("SMA({}) below SMA({})", c.sma_short, c.sma_long),
            ),
            _ => ballot.cast(Vote::Neutral, "moving averages level"),
        }

        let rsi_vote = Vote::from_band(rsi_now, c.rsi_low, c.rsi_high);
        ballot.cast(rsi_vote, rsi_reason(c.rsi_period, rsi_now, rsi_vote));

        let (stoch_k, stoch_d) = match stoch {
            Some(IndicatorValue::Stochastic { k, d }) => (Some(k), Some(d)),
            _ => (None, None),
        };
        match (stoch_k, stoch_d) {
            (Some(k), Some(d)) if k < c.stoch_oversold && k > d => {
                ballot.cast(Vote::Bullish, format!("Stochastic turning up from {:.1}", k))
            }
            (Some(k), Some(d)) if k > c.stoch_overbought && k < d => {
                ballot.cast(Vote::Bearish, format!("Stochastic turning down from {:.1}", k))
            }
            _ => ballot.cast(Vote::Neutral, "no Stochastic turn"),
        }

        let (sar, rising) = match psar {
            Some(IndicatorValue::Psar { sar, rising }) => (Some(sar), Some(rising)),
            _ => (None, None),
        };
        match rising {
            Some(true) => ballot.cast(Vote::Bullish, "Parabolic SAR below price"),
            Some(false) => ballot.cast(Vote::Bearish, "Parabolic SAR above price"),
            None => ballot.cast(Vote::Neutral, "Parabolic SAR unavailable"),
        }

        let signal = ctx
            .signal_from(ballot.decide(&CONFIDENCE), &c.risk)
            .with_reading("sma_short", short)
            .with_reading("sma_long", long)
            .with_reading("rsi", rsi_now)
            .with_reading("stoch_k", stoch_k)
            .with_reading("stoch_d", stoch_d)
            .with_reading("psar", sar);
        Ok(signal)
    }
}
