//! Parabolic SAR using Wilder's acceleration factor.
//!
//! Inherently sequential: keeps direction, extreme point (EP) and
//! acceleration factor (AF). AF starts at `step`, grows by `step` on each new
//! extreme and is capped at `maximum`. The trend flips when price crosses the
//! current SAR; the new SAR is the previous EP.
//!
//! Defaults: step 0.02, maximum 0.20. Index 0 is `None` (direction needs two bars).

use crate::domain::error::EngineError;
use crate::domain::indicator::{
    build_series, require_positive, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_STEP: f64 = 0.02;
pub const DEFAULT_MAXIMUM: f64 = 0.20;

pub fn calculate_psar(bars: &[OhlcvBar], step: f64, maximum: f64) -> Result<IndicatorSeries, EngineError> {
    require_positive("PSAR", "step", step)?;
    require_positive("PSAR", "maximum", maximum)?;
    if maximum < step {
        return Err(EngineError::invalid_parameter(
            "PSAR",
            format!("maximum {maximum} must be at least step {step}"),
        ));
    }

    let indicator_type = IndicatorType::Psar {
        step_x1000: (step * 1000.0).round() as u32,
        max_x1000: (maximum * 1000.0).round() as u32,
    };
    let n = bars.len();
    let mut values = vec![None; n];
    if n < 2 {
        return Ok(build_series(indicator_type, bars, values));
    }

    let mut rising = bars[1].close >= bars[0].close;
    let mut af = step;
    let (mut sar, mut ep) = if rising {
        (bars[0].low, bars[1].high)
    } else {
        (bars[0].high, bars[1].low)
    };
    values[1] = Some(IndicatorValue::Psar { sar, rising });

    for i in 2..n {
        let mut next = sar + af * (ep - sar);

        if rising {
            // SAR may not sit above the two previous lows
            next = next.min(bars[i - 1].low).min(bars[i - 2].low);
            if bars[i].low < next {
                rising = false;
                next = ep;
                ep = bars[i].low;
                af = step;
            } else if bars[i].high > ep {
                ep = bars[i].high;
                af = (af + step).min(maximum);
            }
        } else {
            next = next.max(bars[i - 1].high).max(bars[i - 2].high);
            if bars[i].high > next {
                rising = true;
                next = ep;
                ep = bars[i].high;
                af = step;
            } else if bars[i].low < ep {
                ep = bars[i].low;
                af = (af + step).min(maximum);
            }
        }

        sar = next;
        values[i] = Some(IndicatorValue::Psar { sar, rising });
    }

    Ok(build_series(indicator_type, bars, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::hlc;

    fn sar_at(series: &IndicatorSeries, i: usize) -> (f64, bool) {
        match series.value_at(i) {
            Some(IndicatorValue::Psar { sar, rising }) => (sar, rising),
            other => panic!("expected psar value, got {:?}", other),
        }
    }

    #[test]
    fn psar_uptrend_stays_below_lows() {
        let bars: Vec<OhlcvBar> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                hlc(i, base + 1.0, base - 1.0, base, 1.0)
            })
            .collect();
        let series = calculate_psar(&bars, DEFAULT_STEP, DEFAULT_MAXIMUM).unwrap();

        assert!(!series.values[0].is_valid());
        for i in 1..20 {
            let (sar, rising) = sar_at(&series, i);
            assert!(rising, "index {} should be rising", i);
            assert!(sar <= bars[i].low, "SAR {} above low at {}", sar, i);
        }
    }

    #[test]
    fn psar_flips_on_reversal() {
        let mut bars: Vec<OhlcvBar> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                hlc(i, base + 1.0, base - 1.0, base, 1.0)
            })
            .collect();
        bars.push(hlc(10, 110.0, 90.0, 91.0, 1.0));
        let series = calculate_psar(&bars, DEFAULT_STEP, DEFAULT_MAXIMUM).unwrap();

        let (sar, rising) = sar_at(&series, 10);
        assert!(!rising);
        // new SAR is the prior extreme point: the highest high of the uptrend
        assert!((sar - 119.0).abs() < 1e-9);
    }

    #[test]
    fn psar_acceleration_is_capped() {
        // long persistent uptrend: AF would exceed 0.2 without the cap
        let bars: Vec<OhlcvBar> = (0..40)
            .map(|i| {
                let base = 100.0 * 1.05f64.powi(i as i32);
                hlc(i as usize, base * 1.01, base * 0.99, base, 1.0)
            })
            .collect();
        let series = calculate_psar(&bars, 0.02, 0.2).unwrap();
        let (s38, _) = sar_at(&series, 38);
        let (s39, _) = sar_at(&series, 39);
        let ep = bars[38].high;
        let implied_af = (s39 - s38) / (ep - s38);
        assert!(implied_af <= 0.2 + 1e-9, "AF {} exceeds maximum", implied_af);
    }

    #[test]
    fn psar_rejects_bad_parameters() {
        assert!(calculate_psar(&[], 0.0, 0.2).is_err());
        assert!(calculate_psar(&[], 0.02, 0.01).is_err());
    }

    #[test]
    fn psar_single_bar_is_none() {
        let series = calculate_psar(&[hlc(0, 11.0, 9.0, 10.0, 1.0)], 0.02, 0.2).unwrap();
        assert!(!series.values[0].is_valid());
    }
}
