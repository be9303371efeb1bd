//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (50 when there was no movement at all)
//!
//! Warmup: first n bars are `None` (need n price changes to compute initial average).

use crate::domain::error::EngineError;
use crate::domain::indicator::{build_series, require_period, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, EngineError> {
    require_period("RSI", "period", period)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = rsi_of(&closes, period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple))
        .collect();
    Ok(build_series(IndicatorType::Rsi(period), bars, values))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Wilder RSI over a plain value slice. `period` must be non-zero.
pub(crate) fn rsi_of(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let change_idx = i - 1;

        if change_idx + 1 < period {
            gain_sum += gain;
            loss_sum += loss;
            out.push(None);
        } else if change_idx + 1 == period {
            avg_gain = (gain_sum + gain) / period as f64;
            avg_loss = (loss_sum + loss) / period as f64;
            out.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            out.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
    }
    out
}
