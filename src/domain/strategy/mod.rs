//! Strategy evaluator.
//!
//! A closed set of strategy variants behind one [`Strategy`] trait. Settings
//! are validated when a strategy is registered, so a running
//! [`StrategyRegistry`] only holds evaluators with sound parameters.

pub mod day_trading;
pub mod grid;
pub mod mean_reversion;
pub mod scalping;
pub mod swing_trading;
pub mod triangular_arbitrage;
pub mod votes;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::config_validation::{read_non_negative, read_positive, read_string};
use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{Action, RiskPercentages, Signal};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

pub use day_trading::{DayTrading, DayTradingConfig};
pub use grid::{Grid, GridConfig};
pub use mean_reversion::{MeanReversion, MeanReversionConfig};
pub use scalping::{Scalping, ScalpingConfig};
pub use swing_trading::{SwingTrading, SwingTradingConfig};
pub use triangular_arbitrage::{ArbitrageConfig, TriangularArbitrage};
use votes::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Scalping,
    DayTrading,
    SwingTrading,
    Grid,
    MeanReversion,
    TriangularArbitrage,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Scalping,
        StrategyKind::DayTrading,
        StrategyKind::SwingTrading,
        StrategyKind::Grid,
        StrategyKind::MeanReversion,
        StrategyKind::TriangularArbitrage,
    ];

    /// Canonical name; also the config section holding the variant's parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Scalping => "scalping",
            StrategyKind::DayTrading => "day-trading",
            StrategyKind::SwingTrading => "swing-trading",
            StrategyKind::Grid => "grid",
            StrategyKind::MeanReversion => "mean-reversion",
            StrategyKind::TriangularArbitrage => "triangular-arbitrage",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| EngineError::UnknownStrategy { name: s.to_string() })
    }
}

/// Everything a strategy may look at for one decision.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub symbol: &'a str,
    pub bars: &'a [OhlcvBar],
    pub as_of: DateTime<Utc>,
    pub market: Option<&'a dyn MarketDataPort>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(symbol: &'a str, bars: &'a [OhlcvBar], as_of: DateTime<Utc>) -> Self {
        Self {
            symbol,
            bars,
            as_of,
            market: None,
        }
    }

    pub fn with_market(mut self, market: &'a dyn MarketDataPort) -> Self {
        self.market = Some(market);
        self
    }

    /// Close of the newest bar, 0 when there are no bars.
    pub fn last_close(&self) -> f64 {
        self.bars.last().map(|b| b.close).unwrap_or(0.0)
    }

    pub fn insufficient_data(&self) -> Signal {
        Signal::insufficient_data(self.symbol, self.as_of, self.last_close())
    }

    pub fn hold(&self, reason: impl Into<String>) -> Signal {
        Signal::hold(self.symbol, self.as_of, self.last_close(), reason)
    }

    /// Turns a vote decision into a signal priced at the last close.
    pub fn signal_from(&self, decision: Decision, risk: &RiskPercentages) -> Signal {
        match decision.action {
            Action::Buy | Action::Sell => Signal::directional(
                self.symbol,
                self.as_of,
                self.last_close(),
                decision.action,
                decision.confidence,
                decision.reason,
                risk,
            ),
            Action::Hold | Action::Arbitrage => self.hold(decision.reason),
        }
    }
}

pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Bars needed before the strategy gives anything but an insufficient-data HOLD.
    fn min_bars(&self) -> usize;

    fn evaluate(&self, ctx: &EvaluationContext) -> Result<Signal, EngineError>;
}

/// Typed parameters for one strategy variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum StrategySettings {
    Scalping(ScalpingConfig),
    DayTrading(DayTradingConfig),
    SwingTrading(SwingTradingConfig),
    Grid(GridConfig),
    MeanReversion(MeanReversionConfig),
    TriangularArbitrage(ArbitrageConfig),
}

impl StrategySettings {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategySettings::Scalping(_) => StrategyKind::Scalping,
            StrategySettings::DayTrading(_) => StrategyKind::DayTrading,
            StrategySettings::SwingTrading(_) => StrategyKind::SwingTrading,
            StrategySettings::Grid(_) => StrategyKind::Grid,
            StrategySettings::MeanReversion(_) => StrategyKind::MeanReversion,
            StrategySettings::TriangularArbitrage(_) => StrategyKind::TriangularArbitrage,
        }
    }

    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Scalping => StrategySettings::Scalping(ScalpingConfig::default()),
            StrategyKind::DayTrading => StrategySettings::DayTrading(DayTradingConfig::default()),
            StrategyKind::SwingTrading => StrategySettings::SwingTrading(SwingTradingConfig::default()),
            StrategyKind::Grid => StrategySettings::Grid(GridConfig::default()),
            StrategyKind::MeanReversion => StrategySettings::MeanReversion(MeanReversionConfig::default()),
            StrategyKind::TriangularArbitrage => {
                StrategySettings::TriangularArbitrage(ArbitrageConfig::default())
            }
        }
    }

    /// Reads `[strategy] name` and then that variant's own section.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let name = read_string(config, "strategy", "name")?.ok_or_else(|| EngineError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        })?;
        Self::for_kind(name.parse()?, config)
    }

    /// Settings for `kind`, read from its section with defaults for absent keys.
    pub fn for_kind(kind: StrategyKind, config: &dyn ConfigPort) -> Result<Self, EngineError> {
        Ok(match kind {
            StrategyKind::Scalping => StrategySettings::Scalping(ScalpingConfig::from_config(config)?),
            StrategyKind::DayTrading => StrategySettings::DayTrading(DayTradingConfig::from_config(config)?),
            StrategyKind::SwingTrading => {
                StrategySettings::SwingTrading(SwingTradingConfig::from_config(config)?)
            }
            StrategyKind::Grid => StrategySettings::Grid(GridConfig::from_config(config)?),
            StrategyKind::MeanReversion => {
                StrategySettings::MeanReversion(MeanReversionConfig::from_config(config)?)
            }
            StrategyKind::TriangularArbitrage => {
                StrategySettings::TriangularArbitrage(ArbitrageConfig::from_config(config)?)
            }
        })
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            StrategySettings::Scalping(c) => c.validate(),
            StrategySettings::DayTrading(c) => c.validate(),
            StrategySettings::SwingTrading(c) => c.validate(),
            StrategySettings::Grid(c) => c.validate(),
            StrategySettings::MeanReversion(c) => c.validate(),
            StrategySettings::TriangularArbitrage(c) => c.validate(),
        }
    }

    /// Validates and builds the evaluator.
    pub fn build(self) -> Result<Box<dyn Strategy>, EngineError> {
        self.validate()?;
        Ok(match self {
            StrategySettings::Scalping(c) => Box::new(Scalping::new(c)),
            StrategySettings::DayTrading(c) => Box::new(DayTrading::new(c)),
            StrategySettings::SwingTrading(c) => Box::new(SwingTrading::new(c)),
            StrategySettings::Grid(c) => Box::new(Grid::new(c)),
            StrategySettings::MeanReversion(c) => Box::new(MeanReversion::new(c)),
            StrategySettings::TriangularArbitrage(c) => Box::new(TriangularArbitrage::new(c)),
        })
    }
}

/// Maps each strategy kind to its configured evaluator.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKind, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every variant at its default settings.
    pub fn with_defaults() -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for kind in StrategyKind::ALL {
            registry.register(StrategySettings::default_for(kind))?;
        }
        Ok(registry)
    }

    /// Validates `settings` and installs the evaluator, replacing any previous one.
    pub fn register(&mut self, settings: StrategySettings) -> Result<(), EngineError> {
        let kind = settings.kind();
        let strategy = settings.build()?;
        debug!(strategy = %kind, min_bars = strategy.min_bars(), "registered strategy");
        self.strategies.insert(kind, strategy);
        Ok(())
    }

    pub fn get(&self, kind: StrategyKind) -> Option<&dyn Strategy> {
        self.strategies.get(&kind).map(|s| s.as_ref())
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        let mut kinds: Vec<StrategyKind> = self.strategies.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Resolves `name` and runs that strategy.
    pub fn evaluate(&self, name: &str, ctx: &EvaluationContext) -> Result<Signal, EngineError> {
        let kind: StrategyKind = name.parse()?;
        let strategy = self
            .get(kind)
            .ok_or_else(|| EngineError::UnknownStrategy { name: name.to_string() })?;

        let signal = strategy.evaluate(ctx)?;
        info!(
            strategy = %kind,
            symbol = ctx.symbol,
            action = %signal.action,
            confidence = signal.confidence,
            reason = %signal.reason,
            "strategy evaluated"
        );
        Ok(signal)
    }
}

/// Reads `stop_loss_pct` / `take_profit_pct` from a strategy section.
pub(crate) fn read_risk(
    config: &dyn ConfigPort,
    section: &str,
    defaults: RiskPercentages,
) -> Result<RiskPercentages, EngineError> {
    Ok(RiskPercentages::new(
        read_positive(config, section, "stop_loss_pct", defaults.stop_loss_pct)?,
        read_positive(config, section, "take_profit_pct", defaults.take_profit_pct)?,
    ))
}

/// Reads an oscillator band and checks `0 <= low < high <= 100`.
pub(crate) fn read_band(
    config: &dyn ConfigPort,
    section: &str,
    low_key: &str,
    high_key: &str,
    defaults: (f64, f64),
) -> Result<(f64, f64), EngineError> {
    let low = read_non_negative(config, section, low_key, defaults.0)?;
    let high = read_non_negative(config, section, high_key, defaults.1)?;
    check_band(section, low_key, low, high)?;
    Ok((low, high))
}

pub(crate) fn check_band(section: &str, low_key: &str, low: f64, high: f64) -> Result<(), EngineError> {
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        return Err(EngineError::config_invalid(
            section,
            low_key,
            format!("band {low}..{high} must satisfy 0 <= low < high <= 100"),
        ));
    }
    Ok(())
}

pub(crate) fn check_period(section: &str, key: &str, period: usize) -> Result<(), EngineError> {
    if period == 0 {
        return Err(EngineError::config_invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

pub(crate) fn check_risk(section: &str, risk: &RiskPercentages) -> Result<(), EngineError> {
    if !(risk.stop_loss_pct > 0.0 && risk.stop_loss_pct < 100.0) {
        return Err(EngineError::config_invalid(
            section,
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 100",
        ));
    }
    if !(risk.take_profit_pct > 0.0 && risk.take_profit_pct.is_finite()) {
        return Err(EngineError::config_invalid(
            section,
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }
    Ok(())
}
