//! Composite indicator frame.
//!
//! [`compute_all`] runs every indicator in a fixed order over one bar slice
//! and joins the results into one [`IndicatorRow`] per bar.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::config_validation::{read_period, read_positive};
use crate::domain::error::EngineError;
use crate::domain::indicator::{
    bollinger, calculate_atr, calculate_bollinger, calculate_ema, calculate_ichimoku, calculate_macd,
    calculate_mfi, calculate_obv, calculate_psar, calculate_rsi, calculate_sma, calculate_stochastic,
    calculate_vwap, calculate_williams_r, find_support_resistance, ichimoku, macd, psar, stochastic,
    support_resistance, IndicatorSeries, IndicatorValue, PriceLevel, SupportResistance,
};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "indicators";

/// Parameters for [`compute_all`]. `Default` carries the conventional periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub atr_period: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub williams_period: usize,
    pub mfi_period: usize,
    pub psar_step: f64,
    pub psar_maximum: f64,
    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
    pub ichimoku_displacement: usize,
    pub sr_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_multiplier: bollinger::DEFAULT_MULTIPLIER,
            atr_period: 14,
            stochastic_k: stochastic::DEFAULT_K,
            stochastic_d: stochastic::DEFAULT_D,
            williams_period: 14,
            mfi_period: 14,
            psar_step: psar::DEFAULT_STEP,
            psar_maximum: psar::DEFAULT_MAXIMUM,
            ichimoku_conversion: ichimoku::DEFAULT_CONVERSION,
            ichimoku_base: ichimoku::DEFAULT_BASE,
            ichimoku_span_b: ichimoku::DEFAULT_SPAN_B,
            ichimoku_displacement: ichimoku::DEFAULT_DISPLACEMENT,
            sr_window: support_resistance::DEFAULT_WINDOW,
        }
    }
}

impl IndicatorConfig {
    /// Reads the `[indicators]` section; absent keys keep their defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = Self::default();
        let cfg = Self {
            sma_period: read_period(config, SECTION, "sma_period", d.sma_period)?,
            ema_period: read_period(config, SECTION, "ema_period", d.ema_period)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            macd_fast: read_period(config, SECTION, "macd_fast", d.macd_fast)?,
            macd_slow: read_period(config, SECTION, "macd_slow", d.macd_slow)?,
            macd_signal: read_period(config, SECTION, "macd_signal", d.macd_signal)?,
            bollinger_period: read_period(config, SECTION, "bollinger_period", d.bollinger_period)?,
            bollinger_multiplier: read_positive(
                config,
                SECTION,
                "bollinger_multiplier",
                d.bollinger_multiplier,
            )?,
            atr_period: read_period(config, SECTION, "atr_period", d.atr_period)?,
            stochastic_k: read_period(config, SECTION, "stochastic_k", d.stochastic_k)?,
            stochastic_d: read_period(config, SECTION, "stochastic_d", d.stochastic_d)?,
            williams_period: read_period(config, SECTION, "williams_period", d.williams_period)?,
            mfi_period: read_period(config, SECTION, "mfi_period", d.mfi_period)?,
            psar_step: read_positive(config, SECTION, "psar_step", d.psar_step)?,
            psar_maximum: read_positive(config, SECTION, "psar_maximum", d.psar_maximum)?,
            ichimoku_conversion: read_period(
                config,
                SECTION,
                "ichimoku_conversion",
                d.ichimoku_conversion,
            )?,
            ichimoku_base: read_period(config, SECTION, "ichimoku_base", d.ichimoku_base)?,
            ichimoku_span_b: read_period(config, SECTION, "ichimoku_span_b", d.ichimoku_span_b)?,
            ichimoku_displacement: read_period(
                config,
                SECTION,
                "ichimoku_displacement",
                d.ichimoku_displacement,
            )?,
            sr_window: read_period(config, SECTION, "sr_window", d.sr_window)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Cross-field rules the per-key readers cannot see.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::config_invalid(
                SECTION,
                "macd_fast",
                format!("macd_fast {} must be below macd_slow {}", self.macd_fast, self.macd_slow),
            ));
        }
        if self.psar_maximum < self.psar_step {
            return Err(EngineError::config_invalid(
                SECTION,
                "psar_maximum",
                "psar_maximum must be at least psar_step",
            ));
        }
        Ok(())
    }
}

/// All indicator outputs for one bar. Composite indicators are flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub time: DateTime<Utc>,
    pub close: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub williams_r: Option<f64>,
    pub mfi: Option<f64>,
    pub psar: Option<f64>,
    pub psar_rising: Option<bool>,
    pub vwap: Option<f64>,
    pub obv: Option<f64>,
    pub ichimoku_conversion: Option<f64>,
    pub ichimoku_base: Option<f64>,
    pub ichimoku_span_a: Option<f64>,
    pub ichimoku_span_b: Option<f64>,
    /// Prices of every support whose window has closed by this bar, oldest first.
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

impl IndicatorRow {
    pub fn builder(bar: &OhlcvBar) -> IndicatorRowBuilder {
        IndicatorRowBuilder {
            row: IndicatorRow {
                time: bar.open_time,
                close: bar.close,
                sma: None,
                ema: None,
                rsi: None,
                macd_line: None,
                macd_signal: None,
                macd_histogram: None,
                bb_upper: None,
                bb_middle: None,
                bb_lower: None,
                atr: None,
                stoch_k: None,
                stoch_d: None,
                williams_r: None,
                mfi: None,
                psar: None,
                psar_rising: None,
                vwap: None,
                obv: None,
                ichimoku_conversion: None,
                ichimoku_base: None,
                ichimoku_span_a: None,
                ichimoku_span_b: None,
                supports: Vec::new(),
                resistances: Vec::new(),
            },
        }
    }
}

/// Builds a row one indicator at a time; each setter takes the raw series point.
#[derive(Debug)]
pub struct IndicatorRowBuilder {
    row: IndicatorRow,
}

impl IndicatorRowBuilder {
    pub fn sma(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.sma = value.and_then(|v| v.as_simple());
        self
    }

    pub fn ema(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.ema = value.and_then(|v| v.as_simple());
        self
    }

    pub fn rsi(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.rsi = value.and_then(|v| v.as_simple());
        self
    }

    pub fn macd(mut self, value: Option<IndicatorValue>) -> Self {
        if let Some(IndicatorValue::Macd { line, signal, histogram }) = value {
            self.row.macd_line = Some(line);
            self.row.macd_signal = Some(signal);
            self.row.macd_histogram = Some(histogram);
        }
        self
    }

    pub fn bollinger(mut self, value: Option<IndicatorValue>) -> Self {
        if let Some(IndicatorValue::Bollinger { upper, middle, lower }) = value {
            self.row.bb_upper = Some(upper);
            self.row.bb_middle = Some(middle);
            self.row.bb_lower = Some(lower);
        }
        self
    }

    pub fn atr(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.atr = value.and_then(|v| v.as_simple());
        self
    }

    pub fn stochastic(mut self, value: Option<IndicatorValue>) -> Self {
        if let Some(IndicatorValue::Stochastic { k, d }) = value {
            self.row.stoch_k = Some(k);
            self.row.stoch_d = Some(d);
        }
        self
    }

    pub fn williams_r(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.williams_r = value.and_then(|v| v.as_simple());
        self
    }

    pub fn mfi(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.mfi = value.and_then(|v| v.as_simple());
        self
    }

    pub fn psar(mut self, value: Option<IndicatorValue>) -> Self {
        if let Some(IndicatorValue::Psar { sar, rising }) = value {
            self.row.psar = Some(sar);
            self.row.psar_rising = Some(rising);
        }
        self
    }

    pub fn vwap(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.vwap = value.and_then(|v| v.as_simple());
        self
    }

    pub fn obv(mut self, value: Option<IndicatorValue>) -> Self {
        self.row.obv = value.and_then(|v| v.as_simple());
        self
    }

    pub fn ichimoku(mut self, value: Option<IndicatorValue>) -> Self {
        if let Some(IndicatorValue::Ichimoku {
            conversion,
            base,
            span_a,
            span_b,
        }) = value
        {
            self.row.ichimoku_conversion = Some(conversion);
            self.row.ichimoku_base = Some(base);
            self.row.ichimoku_span_a = span_a;
            self.row.ichimoku_span_b = span_b;
        }
        self
    }

    pub fn levels(mut self, supports: &[PriceLevel], resistances: &[PriceLevel]) -> Self {
        self.row.supports = supports.iter().map(|l| l.price).collect();
        self.row.resistances = resistances.iter().map(|l| l.price).collect();
        self
    }

    pub fn build(self) -> IndicatorRow {
        self.row
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub rows: Vec<IndicatorRow>,
    pub levels: SupportResistance,
}

impl IndicatorFrame {
    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}

/// Tags an indicator failure with the indicator's name.
fn named<T>(indicator: String, result: Result<T, EngineError>) -> Result<T, EngineError> {
    result.map_err(|source| EngineError::IndicatorFailed {
        indicator,
        source: Box::new(source),
    })
}

/// Runs the full indicator set over `bars`.
///
/// Order: SMA, EMA, RSI, MACD, Bollinger, ATR, Stochastic, Williams %R, MFI,
/// PSAR, VWAP, OBV, Ichimoku, support/resistance. The first failure aborts.
/// Each row lists every support and resistance known at that bar, so no row
/// sees a pivot whose window has not closed.
pub fn compute_all(bars: &[OhlcvBar], config: &IndicatorConfig) -> Result<IndicatorFrame, EngineError> {
    let c = config;
    let sma = named(format!("SMA({})", c.sma_period), calculate_sma(bars, c.sma_period))?;
    let ema = named(format!("EMA({})", c.ema_period), calculate_ema(bars, c.ema_period))?;
    let rsi = named(format!("RSI({})", c.rsi_period), calculate_rsi(bars, c.rsi_period))?;
    let macd = named(
        format!("MACD({},{},{})", c.macd_fast, c.macd_slow, c.macd_signal),
        calculate_macd(bars, c.macd_fast, c.macd_slow, c.macd_signal),
    )?;
    let bb = named(
        format!("BOLLINGER({},{})", c.bollinger_period, c.bollinger_multiplier),
        calculate_bollinger(bars, c.bollinger_period, c.bollinger_multiplier),
    )?;
    let atr = named(format!("ATR({})", c.atr_period), calculate_atr(bars, c.atr_period))?;
    let stoch = named(
        format!("STOCHASTIC({},{})", c.stochastic_k, c.stochastic_d),
        calculate_stochastic(bars, c.stochastic_k, c.stochastic_d),
    )?;
    let willr = named(
        format!("WILLR({})", c.williams_period),
        calculate_williams_r(bars, c.williams_period),
    )?;
    let mfi = named(format!("MFI({})", c.mfi_period), calculate_mfi(bars, c.mfi_period))?;
    let psar = named(
        format!("PSAR({},{})", c.psar_step, c.psar_maximum),
        calculate_psar(bars, c.psar_step, c.psar_maximum),
    )?;
    let vwap = named("VWAP".to_string(), calculate_vwap(bars))?;
    let obv = named("OBV".to_string(), calculate_obv(bars))?;
    let ichi = named(
        format!(
            "ICHIMOKU({},{},{},{})",
            c.ichimoku_conversion, c.ichimoku_base, c.ichimoku_span_b, c.ichimoku_displacement
        ),
        calculate_ichimoku(
            bars,
            c.ichimoku_conversion,
            c.ichimoku_base,
            c.ichimoku_span_b,
            c.ichimoku_displacement,
        ),
    )?;
    let levels = named(
        format!("SUPPORT_RESISTANCE({})", c.sr_window),
        find_support_resistance(bars, c.sr_window),
    )?;

    let at = |series: &IndicatorSeries, i: usize| series.value_at(i);
    let rows: Vec<IndicatorRow> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            IndicatorRow::builder(bar)
                .sma(at(&sma, i))
                .ema(at(&ema, i))
                .rsi(at(&rsi, i))
                .macd(at(&macd, i))
                .bollinger(at(&bb, i))
                .atr(at(&atr, i))
                .stochastic(at(&stoch, i))
                .williams_r(at(&willr, i))
                .mfi(at(&mfi, i))
                .psar(at(&psar, i))
                .vwap(at(&vwap, i))
                .obv(at(&obv, i))
                .ichimoku(at(&ichi, i))
                .levels(levels.supports_known_at(i), levels.resistances_known_at(i))
                .build()
        })
        .collect();

    debug!(
        bars = bars.len(),
        supports = levels.supports.len(),
        resistances = levels.resistances.len(),
        "computed indicator frame"
    );

    Ok(IndicatorFrame { rows, levels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::indicator::test_bars::hlc;

    fn wave(n: usize) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + 10.0 * (i as f64 * 0.3).sin();
                hlc(i, close + 1.0, close - 1.0, close, 1000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn frame_has_one_row_per_bar() {
        let bars = wave(120);
        let frame = compute_all(&bars, &IndicatorConfig::default()).unwrap();
        assert_eq!(frame.rows.len(), 120);
        assert_eq!(frame.rows[5].time, bars[5].open_time);
    }

    #[test]
    fn frame_respects_warmups() {
        let bars = wave(120);
        let frame = compute_all(&bars, &IndicatorConfig::default()).unwrap();

        assert!(frame.rows[18].sma.is_none());
        assert!(frame.rows[19].sma.is_some());
        assert!(frame.rows[13].rsi.is_none());
        assert!(frame.rows[14].rsi.is_some());
        // MACD 12/26/9: slow-1 + signal-1
        assert!(frame.rows[32].macd_line.is_none());
        assert!(frame.rows[33].macd_histogram.is_some());
        assert!(frame.rows[0].psar.is_none());
        assert!(frame.rows[1].psar.is_some());
        assert!(frame.rows[0].obv.is_some());
        assert!(frame.rows[24].ichimoku_base.is_none());
        assert!(frame.rows[25].ichimoku_base.is_some());
    }

    #[test]
    fn frame_levels_have_no_lookahead() {
        let bars = wave(120);
        let frame = compute_all(&bars, &IndicatorConfig::default()).unwrap();
        let prices = |levels: &[PriceLevel]| levels.iter().map(|l| l.price).collect::<Vec<_>>();
        for (j, row) in frame.rows.iter().enumerate() {
            let supports = frame.levels.supports_known_at(j);
            let resistances = frame.levels.resistances_known_at(j);
            assert_eq!(row.supports, prices(supports), "row {j}");
            assert_eq!(row.resistances, prices(resistances), "row {j}");
            assert!(supports.iter().all(|l| l.index + frame.levels.window <= j));
            assert!(resistances.iter().all(|l| l.index + frame.levels.window <= j));
        }
    }

    #[test]
    fn later_rows_keep_earlier_levels() {
        let bars = wave(120);
        let frame = compute_all(&bars, &IndicatorConfig::default()).unwrap();
        let last = frame.last().unwrap();
        assert_eq!(last.supports.len(), frame.levels.supports_known_at(119).len());
        assert!(last.supports.len() > 1, "a 120-bar wave has several troughs");
        for pair in frame.rows.windows(2) {
            assert!(pair[1].supports.starts_with(&pair[0].supports));
            assert!(pair[1].resistances.starts_with(&pair[0].resistances));
        }
    }

    #[test]
    fn failing_indicator_is_named() {
        let config = IndicatorConfig {
            atr_period: 0,
            ..Default::default()
        };
        let err = compute_all(&wave(10), &config).unwrap_err();
        match err {
            EngineError::IndicatorFailed { indicator, source } => {
                assert_eq!(indicator, "ATR(0)");
                assert!(matches!(*source, EngineError::InvalidParameter { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_overrides_defaults() {
        let adapter = FileConfigAdapter::from_string(
            "[indicators]\nsma_period = 50\nbollinger_multiplier = 2.5\n",
        )
        .unwrap();
        let config = IndicatorConfig::from_config(&adapter).unwrap();
        assert_eq!(config.sma_period, 50);
        assert_eq!(config.bollinger_multiplier, 2.5);
        assert_eq!(config.rsi_period, 14);
    }

    #[test]
    fn config_rejects_inverted_macd() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nmacd_fast = 30\nmacd_slow = 26\n").unwrap();
        let err = IndicatorConfig::from_config(&adapter).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { .. }));
    }

    #[test]
    fn config_rejects_zero_period() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nrsi_period = 0\n").unwrap();
        assert!(IndicatorConfig::from_config(&adapter).is_err());
    }
}
