//! Domain error types.
//!
//! Insufficient history is deliberately absent: strategies answer it with a
//! neutral HOLD signal. A failed risk check is not an error either; it is a
//! [`RiskVerdict`](crate::domain::risk::RiskVerdict) with `valid == false`.

/// Top-level error type for signalgate.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid parameter for {indicator}: {reason}")]
    InvalidParameter { indicator: String, reason: String },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("upstream unavailable ({source_name}): {reason}")]
    UpstreamUnavailable { source_name: String, reason: String },

    #[error("indicator {indicator} failed: {source}")]
    IndicatorFailed {
        indicator: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_parameter(indicator: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            indicator: indicator.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::UpstreamUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::UpstreamUnavailable { .. } => 3,
            EngineError::InvalidParameter { .. }
            | EngineError::IndicatorFailed { .. }
            | EngineError::UnknownStrategy { .. } => 4,
            EngineError::InvalidBar { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
