//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! The incremental form keeps a constant input exactly constant.
//! Warmup: first (n-1) bars are `None`.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("EMA", "period", period)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = ema_of(&closes, period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();
    Ok(build_series(IndicatorType::Ema(period), bars, values))
}

/// EMA over a plain value slice. `period` must be non-zero.
pub(crate) fn ema_of(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(input.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &value) in input.iter().enumerate() {
        if i + 1 < period {
            sum += value;
            out.push(None);
        } else if i + 1 == period {
            sum += value;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema += k * (value - ema);
            out.push(Some(ema));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::from_closes;

    #[test]
    fn ema_warmup() {
        let bars = from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3).unwrap();

        assert!(!series.values[0].is_valid());
        assert!(!series.values[1].is_valid());
        assert!(series.values[2].is_valid());
        assert!(series.values[3].is_valid());
        assert!(series.values[4].is_valid());
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let bars = from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1).unwrap();

        assert!((series.simple_at(0).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((series.simple_at(1).unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((series.simple_at(2).unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3).unwrap();
        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((series.simple_at(2).unwrap() - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3).unwrap();

        let k = 2.0 / 4.0;
        let sma = 20.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((series.simple_at(3).unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((series.simple_at(4).unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let bars = from_closes(&[100.0; 5]);
        let series = calculate_ema(&bars, 3).unwrap();
        for i in 2..5 {
            assert!((series.simple_at(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_indicator_type() {
        let bars = from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 5).unwrap();
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
        assert!(series.values.iter().all(|p| !p.is_valid()));
    }

    #[test]
    fn ema_period_0() {
        let bars = from_closes(&[10.0, 20.0]);
        assert!(calculate_ema(&bars, 0).is_err());
    }
}
