//! Williams %R, reported as a magnitude on the 0..=100 scale.
//!
//! value = 100 × (HH(n) − C) / (HH(n) − LL(n)). 0 means the close sits at the
//! period high (overbought side), 100 at the period low (oversold side). The
//! conventional signed reading is `-value`. A flat range reads 50.

use crate::domain::error::EngineError;
use crate::domain::indicator::stochastic::percent_of_range;
use crate::domain::indicator::{
    build_series, high_low, require_period, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_williams_r(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("WILLR", "period", period)?;

    let values = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let (hh, ll) = high_low(bars, i + 1 - period, i);
            Some(IndicatorValue::Simple(100.0 - percent_of_range(bars[i].close, hh, ll)))
        })
        .collect();

    Ok(build_series(IndicatorType::WilliamsR(period), bars, values))
}
