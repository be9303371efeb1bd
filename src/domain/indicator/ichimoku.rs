//! Ichimoku Kinko Hyo.
//!
//! - conversion (tenkan) = midpoint of HH/LL over `conversion` bars
//! - base (kijun) = midpoint of HH/LL over `base` bars
//! - span A = (conversion + base) / 2, plotted `displacement` bars ahead
//! - span B = midpoint over `span_b` bars, plotted `displacement` bars ahead
//!
//! Projection past the last bar is dropped, so the series keeps the input
//! length. A point is emitted once conversion and base both exist; the spans
//! stay `None` until their displaced source exists.

use crate::domain::error::EngineError;
use crate::domain::indicator::{
    build_series, high_low, require_period, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_CONVERSION: usize = 9;
pub const DEFAULT_BASE: usize = 26;
pub const DEFAULT_SPAN_B: usize = 52;
pub const DEFAULT_DISPLACEMENT: usize = 26;

pub fn calculate_ichimoku(
    bars: &[OhlcvBar],
    conversion: usize,
    base: usize,
    span_b: usize,
    displacement: usize,
) -> Result<IndicatorSeries, EngineError> {
    require_period("ICHIMOKU", "conversion", conversion)?;
    require_period("ICHIMOKU", "base", base)?;
    require_period("ICHIMOKU", "span_b", span_b)?;

    let conversion_line = midpoints(bars, conversion);
    let base_line = midpoints(bars, base);
    let span_b_source = midpoints(bars, span_b);

    let span_a_source: Vec<Option<f64>> = conversion_line
        .iter()
        .zip(&base_line)
        .map(|(c, b)| Some((c.as_ref()? + b.as_ref()?) / 2.0))
        .collect();

    let displaced = |source: &[Option<f64>], i: usize| -> Option<f64> {
        i.checked_sub(displacement).and_then(|src| source[src])
    };

    let values = (0..bars.len())
        .map(|i| {
            Some(IndicatorValue::Ichimoku {
                conversion: conversion_line[i]?,
                base: base_line[i]?,
                span_a: displaced(&span_a_source[..], i),
                span_b: displaced(&span_b_source[..], i),
            })
        })
        .collect();

    Ok(build_series(
        IndicatorType::Ichimoku {
            conversion,
            base,
            span_b,
            displacement,
        },
        bars,
        values,
    ))
}

fn midpoints(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let (hh, ll) = high_low(bars, i + 1 - period, i);
            Some((hh + ll) / 2.0)
        })
        .collect()
}
