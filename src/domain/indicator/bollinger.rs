//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are `None`.

use crate::domain::error::EngineError;
use crate::domain::indicator::stddev::mean_and_stddev;
use crate::domain::indicator::{
    build_series, require_period, require_positive, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    multiplier: f64,
) -> Result<IndicatorSeries, EngineError> {
    require_period("BOLLINGER", "period", period)?;
    require_positive("BOLLINGER", "multiplier", multiplier)?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let (middle, stddev) = mean_and_stddev(&closes[i + 1 - period..=i]);
            Some(IndicatorValue::Bollinger {
                upper: middle + multiplier * stddev,
                middle,
                lower: middle - multiplier * stddev,
            })
        })
        .collect();

    Ok(build_series(
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (multiplier * 100.0).round() as u32,
        },
        bars,
        values,
    ))
}
