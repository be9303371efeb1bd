//! Day trading: MACD momentum, RSI extremes and price against session VWAP.

use serde::Serialize;

use crate::domain::config_validation::read_period;
use crate::domain::error::EngineError;
use crate::domain::indicator::{calculate_macd, calculate_rsi, calculate_vwap, IndicatorValue};
use crate::domain::signal::{RiskPercentages, Signal};
use crate::domain::strategy::scalping::rsi_reason;
use crate::domain::strategy::votes::{Ballot, ConfidenceTable, Vote};
use crate::domain::strategy::{
    check_band, check_period, check_risk, read_band, read_risk, EvaluationContext, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "day-trading";
const CONFIDENCE: ConfidenceTable = ConfidenceTable::new(0.65, 0.85, 0.90);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTradingConfig {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub risk: RiskPercentages,
}

impl Default for DayTradingConfig {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            risk: RiskPercentages::new(1.0, 2.0),
        }
    }
}

impl DayTradingConfig {
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
            macd_fast: read_period(config, SECTION, "macd_fast", d.macd_fast)?,
            macd_slow: read_period(config, SECTION, "macd_slow", d.macd_slow)?,
            macd_signal: read_period(config, SECTION, "macd_signal", d.macd_signal)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            rsi_oversold,
            rsi_overbought,
            risk: read_risk(config, SECTION, d.risk)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_period(SECTION, "macd_fast", self.macd_fast)?;
        check_period(SECTION, "macd_signal", self.macd_signal)?;
        check_period(SECTION, "rsi_period", self.rsi_period)?;
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::config_invalid(
                SECTION,
                "macd_fast",
                format!("macd_fast {} must be below macd_slow {}", self.macd_fast, self.macd_slow),
            ));
        }
        check_band(SECTION, "rsi_oversold", self.rsi_oversold, self.rsi_overbought)?;
        check_risk(SECTION, &self.risk)
    }
}

#[derive(Debug, Clone)]
pub struct DayTrading {
    config: DayTradingConfig,
}

impl DayTrading {
    pub fn new(config: DayTradingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for DayTrading {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DayTrading
    }

    fn min_bars(&self) -> usize {
        (self.config.macd_slow + self.config.macd_signal - 1).max(self.config.rsi_period + 1)
    }

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        if ctx.bars.len() < self.min_bars() {
            return Ok(ctx.insufficient_data());
        }
        let c = &self.config;
        let last = ctx.bars.len() - 1;
        let close = ctx.bars[last].close;

        let macd = calculate_macd(ctx.bars, c.macd_fast, c.macd_slow, c.macd_signal)?;
        let rsi = calculate_rsi(ctx.bars, c.rsi_period)?;
        let vwap = calculate_vwap(ctx.bars)?;

        let mut ballot = Ballot::new();

        let histogram = match macd.value_at(last) {
            Some(IndicatorValue::Macd { histogram, .. }) => Some(histogram),
            _ => None,
        };
        let macd_vote = Vote::from_sign(histogram);
        let macd_reason = match macd_vote {
            Vote::Bullish => "MACD histogram positive",
            Vote::Bearish => "MACD histogram negative",
            Vote::Neutral => "MACD histogram flat",
        };
        ballot.cast(macd_vote, macd_reason);

        let rsi_now = rsi.simple_at(last);
        let rsi_vote = Vote::from_band(rsi_now, c.rsi_oversold, c.rsi_overbought);
        ballot.cast(rsi_vote, rsi_reason(c.rsi_period, rsi_now, rsi_vote));

        let vwap_now = vwap.simple_at(last);
        match vwap_now {
            Some(v) if close > v => ballot.cast(Vote::Bullish, format!("close above VWAP {:.2}", v)),
            Some(v) if close < v => ballot.cast(Vote::Bearish, format!("close below VWAP {:.2}", v)),
            _ => ballot.cast(Vote::Neutral, "close at VWAP"),
        }

        let signal = ctx
            .signal_from(ballot.decide(&CONFIDENCE), &c.risk)
            .with_reading("macd_histogram", histogram)
            .with_reading("rsi", rsi_now)
            .with_reading("vwap", vwap_now);
        Ok(signal)
    }
}
