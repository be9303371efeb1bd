//! Money Flow Index.
//!
//! Raw flow = typical_price × volume, signed by the typical-price change
//! against the previous bar. MFI = 100 − 100 / (1 + positive / negative) over
//! the last n changes. No negative flow reads 100; no flow at all reads 50.
//! Warmup: first n bars are `None`.

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_mfi(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("MFI", "period", period)?;

    // flows[i] holds the signed flow of bar i+1
    let flows: Vec<(f64, f64)> = bars
        .windows(2)
        .map(|pair| {
            let prev_tp = pair[0].typical_price();
            let tp = pair[1].typical_price();
            let raw = tp * pair[1].volume;
            if tp > prev_tp {
                (raw, 0.0)
            } else if tp < prev_tp {
                (0.0, raw)
            } else {
                (0.0, 0.0)
            }
        })
        .collect();

    let values = (0..bars.len())
        .map(|i| {
            if i < period {
                return None;
            }
            let (positive, negative) = flows[i - period..i]
                .iter()
                .fold((0.0, 0.0), |(p, n), (fp, fnv)| (p + fp, n + fnv));
            let mfi = if negative == 0.0 && positive == 0.0 {
                50.0
            } else if negative == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + positive / negative)
            };
            Some(IndicatorValue::Simple(mfi))
        })
        .collect();

    Ok(build_series(IndicatorType::Mfi(period), bars, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::{flat, hlc};

    #[test]
    fn mfi_warmup() {
        let bars: Vec<OhlcvBar> = (0..6).map(|i| flat(i, 10.0 + i as f64, 100.0)).collect();
        let series = calculate_mfi(&bars, 3).unwrap();
        for i in 0..3 {
            assert!(!series.values[i].is_valid());
        }
        assert!(series.values[3].is_valid());
    }

    #[test]
    fn mfi_rising_only_is_100() {
        let bars: Vec<OhlcvBar> = (0..5).map(|i| flat(i, 10.0 + i as f64, 100.0)).collect();
        let series = calculate_mfi(&bars, 3).unwrap();
        assert!((series.simple_at(4).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mfi_mixed_flow() {
        let bars = vec![
            flat(0, 10.0, 100.0),
            flat(1, 11.0, 100.0),
            flat(2, 10.0, 200.0),
        ];
        let series = calculate_mfi(&bars, 2).unwrap();
        // positive 11*100 = 1100, negative 10*200 = 2000
        let expected = 100.0 - 100.0 / (1.0 + 1100.0 / 2000.0);
        assert!((series.simple_at(2).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn mfi_flat_prices_is_50() {
        let bars: Vec<OhlcvBar> = (0..4).map(|i| hlc(i, 11.0, 9.0, 10.0, 100.0)).collect();
        let series = calculate_mfi(&bars, 2).unwrap();
        assert!((series.simple_at(3).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mfi_zero_period() {
        assert!(calculate_mfi(&[], 0).is_err());
    }
}
