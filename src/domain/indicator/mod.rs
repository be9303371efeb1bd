//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series (`None` during warm-up)
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every `calculate_*` function is pure: it reads a bar slice, returns a series of
//! the same length and reports out-of-domain parameters as
//! [`EngineError::InvalidParameter`].

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod psar;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod support_resistance;
pub mod vwap;
pub mod williams_r;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use ichimoku::calculate_ichimoku;
pub use macd::calculate_macd;
pub use mfi::calculate_mfi;
pub use obv::calculate_obv;
pub use psar::calculate_psar;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use stochastic::calculate_stochastic;
pub use support_resistance::{find_support_resistance, PriceLevel, SupportResistance};
pub use vwap::calculate_vwap;
pub use williams_r::calculate_williams_r;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub time: DateTime<Utc>,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Psar {
        sar: f64,
        rising: bool,
    },
    Ichimoku {
        conversion: f64,
        base: f64,
        span_a: Option<f64>,
        span_b: Option<f64>,
    },
}

impl IndicatorValue {
    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    WilliamsR(usize),
    Mfi(usize),
    Obv,
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Psar {
        step_x1000: u32,
        max_x1000: u32,
    },
    Ichimoku {
        conversion: usize,
        base: usize,
        span_b: usize,
        displacement: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.value_at(index).and_then(|v| v.as_simple())
    }

    pub fn last_value(&self) -> Option<IndicatorValue> {
        self.values.last().and_then(|p| p.value)
    }

    pub fn last_simple(&self) -> Option<f64> {
        self.last_value().and_then(|v| v.as_simple())
    }

    /// Index of the first non-`None` point.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(IndicatorPoint::is_valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::WilliamsR(period) => write!(f, "WILLR({})", period),
            IndicatorType::Mfi(period) => write!(f, "MFI({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Psar {
                step_x1000,
                max_x1000,
            } => {
                let step = *step_x1000 as f64 / 1000.0;
                let max = *max_x1000 as f64 / 1000.0;
                write!(f, "PSAR({},{})", step, max)
            }
            IndicatorType::Ichimoku {
                conversion,
                base,
                span_b,
                displacement,
            } => write!(
                f,
                "ICHIMOKU({},{},{},{})",
                conversion, base, span_b, displacement
            ),
        }
    }
}

/// Rejects a zero period with an `InvalidParameter` naming the indicator.
pub(crate) fn require_period(indicator: &str, name: &str, period: usize) -> Result<(), EngineError> {
    if period == 0 {
        return Err(EngineError::invalid_parameter(
            indicator,
            format!("{name} must be positive"),
        ));
    }
    Ok(())
}

/// Rejects non-finite or non-positive multipliers and factors.
pub(crate) fn require_positive(indicator: &str, name: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::invalid_parameter(
            indicator,
            format!("{name} must be a positive number, got {value}"),
        ));
    }
    Ok(())
}

/// Zips bar timestamps with computed values into a series.
pub(crate) fn build_series(
    indicator_type: IndicatorType,
    bars: &[OhlcvBar],
    values: Vec<Option<IndicatorValue>>,
) -> IndicatorSeries {
    debug_assert_eq!(bars.len(), values.len());
    let values = bars
        .iter()
        .zip(values)
        .map(|(bar, value)| IndicatorPoint {
            time: bar.open_time,
            value,
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Highest high and lowest low over `bars[start..=end]`.
pub(crate) fn high_low(bars: &[OhlcvBar], start: usize, end: usize) -> (f64, f64) {
    bars[start..=end]
        .iter()
        .fold((f64::MIN, f64::MAX), |(hh, ll), b| (hh.max(b.high), ll.min(b.low)))
}
