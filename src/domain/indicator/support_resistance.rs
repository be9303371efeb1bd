//! Pivot-based support and resistance levels.
//!
//! Bar `i` is a support when its low is the lowest low of `bars[i-w..=i+w]`,
//! a resistance when its high is the highest high of the same window. Bars
//! without a full window on both sides never qualify.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::indicator::{high_low, require_period};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevel {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportResistance {
    pub window: usize,
    pub supports: Vec<PriceLevel>,
    pub resistances: Vec<PriceLevel>,
}

impl SupportResistance {
    /// Supports whose right-hand window has closed by bar `j`.
    pub fn supports_known_at(&self, j: usize) -> &[PriceLevel] {
        known_prefix(&self.supports, self.window, j)
    }

    /// Resistances whose right-hand window has closed by bar `j`.
    pub fn resistances_known_at(&self, j: usize) -> &[PriceLevel] {
        known_prefix(&self.resistances, self.window, j)
    }
}

// levels are ordered by index, so "known at j" is always a prefix
fn known_prefix(levels: &[PriceLevel], window: usize, j: usize) -> &[PriceLevel] {
    let count = levels.partition_point(|level| level.index + window <= j);
    &levels[..count]
}

pub fn find_support_resistance(bars: &[OhlcvBar], window: usize) -> Result<SupportResistance, EngineError> {
    require_period("SUPPORT_RESISTANCE", "window", window)?;

    let mut supports = Vec::new();
    let mut resistances = Vec::new();

    for i in window..bars.len().saturating_sub(window) {
        let (hh, ll) = high_low(bars, i - window, i + window);
        let bar = &bars[i];
        if bar.low <= ll {
            supports.push(PriceLevel {
                index: i,
                time: bar.open_time,
                price: bar.low,
            });
        }
        if bar.high >= hh {
            resistances.push(PriceLevel {
                index: i,
                time: bar.open_time,
                price: bar.high,
            });
        }
    }

    Ok(SupportResistance {
        window,
        supports,
        resistances,
    })
}
