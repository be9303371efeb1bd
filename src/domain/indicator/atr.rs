//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-prevClose|, |low-prevClose|).
//! Seed at index n-1 is the mean of the first n true ranges, then
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("ATR", "period", period)?;

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;
    for i in 0..bars.len() {
        if i + 1 < period {
            values.push(None);
        } else if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
            values.push(Some(IndicatorValue::Simple(atr)));
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            values.push(Some(IndicatorValue::Simple(atr)));
        }
    }

    Ok(build_series(IndicatorType::Atr(period), bars, values))
}
