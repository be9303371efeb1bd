//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are `None`.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("SMA", "period", period)?;

    let values = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            Some(IndicatorValue::Simple(mean))
        })
        .collect();

    Ok(build_series(IndicatorType::Sma(period), bars, values))
}

/// Trailing mean of a plain value slice, used by derived series (%D, z-scores).
pub(crate) fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
