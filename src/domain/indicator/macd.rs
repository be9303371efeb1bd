//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars.

use crate::domain::error::EngineError;
use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<IndicatorSeries, EngineError> {
    require_period("MACD", "fast", fast)?;
    require_period("MACD", "slow", slow)?;
    require_period("MACD", "signal", signal_period)?;
    if fast >= slow {
        return Err(EngineError::invalid_parameter(
            "MACD",
            format!("fast period {fast} must be shorter than slow period {slow}"),
        ));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_of(&closes, fast);
    let ema_slow = ema_of(&closes, slow);

    let macd_warmup = slow - 1;
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .skip(macd_warmup)
        .map(|(f, s)| f.unwrap_or(0.0) - s.unwrap_or(0.0))
        .collect();
    let signal_line = ema_of(&macd_line, signal_period);

    let mut values = vec![None; macd_warmup.min(bars.len())];
    for (line, signal) in macd_line.iter().zip(signal_line) {
        values.push(signal.map(|signal| IndicatorValue::Macd {
            line: *line,
            signal,
            histogram: line - signal,
        }));
    }

    Ok(build_series(
        IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        bars,
        values,
    ))
}
