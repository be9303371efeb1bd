//! Typed readers over [`ConfigPort`] and whole-file validation.
//!
//! Absent keys fall back to the caller's default. A present key that does not
//! parse, or that falls outside its domain, is a `ConfigInvalid` naming the
//! section and key.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::error::EngineError;
use crate::domain::indicator_set::IndicatorConfig;
use crate::domain::risk::sizing::KellyConfig;
use crate::domain::risk::RiskLimits;
use crate::domain::strategy::{StrategyKind, StrategySettings};
use crate::ports::config_port::ConfigPort;

/// Sections read outside the per-strategy ones. `default` holds keys that
/// appear before the first header.
const ENGINE_SECTIONS: [&str; 6] = ["default", "strategy", "indicators", "risk", "sizing", "account"];

/// Loads every section the engine understands and reports the first problem.
/// Unrecognized sections are logged and otherwise ignored.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    for section in unknown_sections(config) {
        warn!(section = %section, "ignoring unrecognized config section");
    }
    StrategySettings::from_config(config)?;
    IndicatorConfig::from_config(config)?;
    RiskLimits::from_config(config)?;
    KellyConfig::from_config(config)?;
    Ok(())
}

/// Sections present in `config` that no reader consumes, usually typos.
pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    let mut unknown: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| {
            let name = s.as_str();
            !ENGINE_SECTIONS.contains(&name) && !StrategyKind::ALL.iter().any(|k| k.as_str() == name)
        })
        .collect();
    unknown.sort();
    unknown
}

fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, EngineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EngineError::config_invalid(section, key, format!("expected {expected}, got '{raw}'"))),
    }
}

/// A strictly positive integer such as an indicator period.
pub fn read_period(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, EngineError> {
    match parse_value::<i64>(config, section, key, "an integer")? {
        None => Ok(default),
        Some(v) if v <= 0 => Err(EngineError::config_invalid(section, key, format!("{key} must be positive"))),
        Some(v) => Ok(v as usize),
    }
}

/// A non-negative integer count.
pub fn read_count(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, EngineError> {
    match parse_value::<i64>(config, section, key, "an integer")? {
        None => Ok(default),
        Some(v) if v < 0 => Err(EngineError::config_invalid(section, key, format!("{key} must not be negative"))),
        Some(v) => Ok(v as usize),
    }
}

/// A finite, strictly positive number.
pub fn read_positive(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
    let value = parse_value::<f64>(config, section, key, "a number")?.unwrap_or(default);
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::config_invalid(section, key, format!("{key} must be positive")));
    }
    Ok(value)
}

/// A finite number that may be zero but not negative.
pub fn read_non_negative(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
    let value = parse_value::<f64>(config, section, key, "a number")?.unwrap_or(default);
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::config_invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

/// A fraction in the open interval (0, 1).
pub fn read_fraction(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, EngineError> {
    let value = parse_value::<f64>(config, section, key, "a number")?.unwrap_or(default);
    if !(value > 0.0 && value < 1.0) {
        return Err(EngineError::config_invalid(section, key, format!("{key} must be between 0 and 1")));
    }
    Ok(value)
}

/// A strictly positive decimal, for money and ratio limits.
pub fn read_decimal(config: &dyn ConfigPort, section: &str, key: &str, default: Decimal) -> Result<Decimal, EngineError> {
    let value = parse_value::<Decimal>(config, section, key, "a decimal")?.unwrap_or(default);
    if value <= Decimal::ZERO {
        return Err(EngineError::config_invalid(section, key, format!("{key} must be positive")));
    }
    Ok(value)
}

/// An optional string that, when present, must not be blank.
pub fn read_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<String>, EngineError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => {
            Err(EngineError::config_invalid(section, key, format!("{key} must not be empty")))
        }
        Some(raw) => Ok(Some(raw.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use rust_decimal_macros::dec;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn period_missing_uses_default() {
        let cfg = adapter("[indicators]\n");
        assert_eq!(read_period(&cfg, "indicators", "rsi_period", 14).unwrap(), 14);
    }

    #[test]
    fn period_rejects_non_numeric() {
        let cfg = adapter("[indicators]\nrsi_period = fast\n");
        let err = read_period(&cfg, "indicators", "rsi_period", 14).unwrap_err();
        match err {
            EngineError::ConfigInvalid { section, key, .. } => {
                assert_eq!(section, "indicators");
                assert_eq!(key, "rsi_period");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn period_rejects_negative() {
        let cfg = adapter("[indicators]\nrsi_period = -3\n");
        assert!(read_period(&cfg, "indicators", "rsi_period", 14).is_err());
    }

    #[test]
    fn fraction_bounds() {
        let cfg = adapter("[grid]\nspacing = 1.5\ntolerance = 0.002\n");
        assert!(read_fraction(&cfg, "grid", "spacing", 0.01).is_err());
        assert_eq!(read_fraction(&cfg, "grid", "tolerance", 0.01).unwrap(), 0.002);
    }

    #[test]
    fn non_negative_accepts_zero() {
        let cfg = adapter("[triangular-arbitrage]\nfee = 0\n");
        assert_eq!(read_non_negative(&cfg, "triangular-arbitrage", "fee", 0.001).unwrap(), 0.0);
    }

    #[test]
    fn decimal_parses_exactly() {
        let cfg = adapter("[risk]\nmax_position_size = 0.02\n");
        assert_eq!(
            read_decimal(&cfg, "risk", "max_position_size", dec!(0.10)).unwrap(),
            dec!(0.02)
        );
    }

    #[test]
    fn string_trimmed_or_none() {
        let cfg = adapter("[strategy]\nname = grid\n");
        assert_eq!(read_string(&cfg, "strategy", "name").unwrap(), Some("grid".to_string()));
        assert_eq!(read_string(&cfg, "strategy", "missing").unwrap(), None);
    }

    #[test]
    fn count_accepts_zero_rejects_negative() {
        let cfg = adapter("[account]\nopen_positions = 0\nclosed = -1\n");
        assert_eq!(read_count(&cfg, "account", "open_positions", 5).unwrap(), 0);
        assert!(read_count(&cfg, "account", "closed", 0).is_err());
        assert_eq!(read_count(&cfg, "account", "missing", 5).unwrap(), 5);
    }

    #[test]
    fn unknown_sections_flags_typos_only() {
        let cfg = adapter("[strategy]\nname = grid\n\n[grid]\nlevels = 4\n\n[risks]\nmax_leverage = 2\n\n[mean-reversion]\nperiod = 20\n");
        assert_eq!(unknown_sections(&cfg), vec!["risks".to_string()]);
    }

    #[test]
    fn validate_config_tolerates_unknown_sections() {
        let cfg = adapter("[strategy]\nname = grid\n\n[notes]\nowner = desk\n");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn validate_config_accepts_defaults() {
        let cfg = adapter("[strategy]\nname = swing-trading\n");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn validate_config_reports_unknown_strategy() {
        let cfg = adapter("[strategy]\nname = martingale\n");
        assert!(matches!(
            validate_config(&cfg).unwrap_err(),
            EngineError::UnknownStrategy { .. }
        ));
    }
}
