//! Domain error types.
//!
//! Undefined indicator values are not errors: they are carried as `None`
//! through every series. The variants below are the hard failures that
//! surface to callers of `calculate`, `backtest` and `optimize`.

/// Top-level error type for stratlab.
#[derive(Debug, thiserror::Error)]
pub enum StratlabError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("price series is not strictly increasing at bar {index}")]
    UnorderedSeries { index: usize },

    #[error("{name} window of {window} exceeds the {bars} available bars")]
    WindowTooLong {
        name: String,
        window: usize,
        bars: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("series length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

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

    #[error("{operation} called before calculate: {reason}")]
    Precondition {
        operation: &'static str,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratlabError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        StratlabError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's configuration or input shape.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StratlabError::EmptySeries
                | StratlabError::UnorderedSeries { .. }
                | StratlabError::WindowTooLong { .. }
                | StratlabError::InvalidParameter { .. }
                | StratlabError::LengthMismatch { .. }
                | StratlabError::ConfigParse { .. }
                | StratlabError::ConfigMissing { .. }
                | StratlabError::ConfigInvalid { .. }
        )
    }
}

impl From<&StratlabError> for std::process::ExitCode {
    fn from(err: &StratlabError) -> Self {
        let code: u8 = match err {
            StratlabError::Io(_) => 1,
            StratlabError::EmptySeries
            | StratlabError::UnorderedSeries { .. }
            | StratlabError::WindowTooLong { .. }
            | StratlabError::InvalidParameter { .. }
            | StratlabError::LengthMismatch { .. }
            | StratlabError::ConfigParse { .. }
            | StratlabError::ConfigMissing { .. }
            | StratlabError::ConfigInvalid { .. } => 2,
            StratlabError::Data { .. } => 3,
            StratlabError::Precondition { .. } => 4,
            StratlabError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_too_long_message() {
        let err = StratlabError::WindowTooLong {
            name: "SMA".into(),
            window: 30,
            bars: 10,
        };
        assert_eq!(
            err.to_string(),
            "SMA window of 30 exceeds the 10 available bars"
        );
    }

    #[test]
    fn precondition_message() {
        let err = StratlabError::Precondition {
            operation: "optimize",
            reason: "no evaluation available".into(),
        };
        assert_eq!(
            err.to_string(),
            "optimize called before calculate: no evaluation available"
        );
    }

    #[test]
    fn configuration_classification() {
        assert!(StratlabError::EmptySeries.is_configuration());
        assert!(StratlabError::invalid_parameter("length", "must be positive").is_configuration());
        assert!(
            !StratlabError::Precondition {
                operation: "backtest",
                reason: String::new(),
            }
            .is_configuration()
        );
        assert!(
            !StratlabError::NoData {
                symbol: "AAPL".into()
            }
            .is_configuration()
        );
    }
}
