//! Stochastic oscillator.
//!
//! %K = 100 × (C − LL(k)) / (HH(k) − LL(k)), 50 when the range is flat.
//! %D = SMA(d) of %K. A point is emitted once both lines exist,
//! i.e. from index (k-1) + (d-1).

use crate::domain::error::EngineError;
use crate::domain::indicator::sma::mean_of;
use crate::domain::indicator::{
    build_series, high_low, require_period, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_K: usize = 14;
pub const DEFAULT_D: usize = 3;

pub fn calculate_stochastic(
    bars: &[OhlcvBar],
    k_period: usize,
    d_period: usize,
) -> Result<IndicatorSeries, EngineError> {
    require_period("STOCHASTIC", "k_period", k_period)?;
    require_period("STOCHASTIC", "d_period", d_period)?;

    let raw_k: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if i + 1 < k_period {
                return None;
            }
            let (hh, ll) = high_low(bars, i + 1 - k_period, i);
            Some(percent_of_range(bars[i].close, hh, ll))
        })
        .collect();

    let values = (0..bars.len())
        .map(|i| {
            let k = raw_k[i]?;
            if i + 2 < k_period + d_period {
                return None;
            }
            let window: Vec<f64> = raw_k[i + 1 - d_period..=i].iter().flatten().copied().collect();
            Some(IndicatorValue::Stochastic {
                k,
                d: mean_of(&window),
            })
        })
        .collect();

    Ok(build_series(
        IndicatorType::Stochastic { k_period, d_period },
        bars,
        values,
    ))
}

/// Position of `close` inside [ll, hh] scaled to 0..=100.
pub(crate) fn percent_of_range(close: f64, hh: f64, ll: f64) -> f64 {
    let range = hh - ll;
    if range <= 0.0 {
        return 50.0;
    }
    (100.0 * (close - ll) / range).clamp(0.0, 100.0)
}
