//! Standard Deviation indicator.
//!
//! Population standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) bars are `None`.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("STDDEV", "period", period)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let values = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let (_, sd) = mean_and_stddev(&closes[i + 1 - period..=i]);
            Some(IndicatorValue::Simple(sd))
        })
        .collect();

    Ok(build_series(IndicatorType::Stddev(period), bars, values))
}

/// Mean and population standard deviation (divides by N).
pub(crate) fn mean_and_stddev(window: &[f64]) -> (f64, f64) {
    if window.is_empty() {
        return (0.0, 0.0);
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}
