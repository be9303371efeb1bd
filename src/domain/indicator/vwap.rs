//! Volume Weighted Average Price, cumulative from the first bar.
//!
//! VWAP[i] = Σ(typical_price·volume)[0..=i] / Σvolume[0..=i]. The sums never
//! reset; a point is `None` while the cumulative volume is still zero.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> Result<IndicatorSeries, EngineError> {
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    let values = bars
        .iter()
        .map(|bar| {
            cum_pv += bar.typical_price() * bar.volume;
            cum_volume += bar.volume;
            (cum_volume > 0.0).then(|| IndicatorValue::Simple(cum_pv / cum_volume))
        })
        .collect();

    Ok(build_series(IndicatorType::Vwap, bars, values))
}
