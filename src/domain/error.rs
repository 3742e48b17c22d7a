//! Domain error types.

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmacrossError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SmacrossError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) | SmacrossError::Report { .. } => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. } => 2,
            SmacrossError::InvalidParameter { .. } => 3,
            SmacrossError::Data { .. } | SmacrossError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn invalid_parameter_display() {
        let err = SmacrossError::invalid_parameter("window", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid parameter window: must be at least 1"
        );
    }

    #[test]
    fn config_invalid_display() {
        let err = SmacrossError::ConfigInvalid {
            section: "backtest".into(),
            key: "short_window".into(),
            reason: "must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [backtest] short_window: must be at least 1"
        );
    }

    #[test]
    fn exit_codes_by_family() {
        let cases = [
            (SmacrossError::invalid_parameter("x", "y"), ExitCode::from(3)),
            (
                SmacrossError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                },
                ExitCode::from(2),
            ),
            (
                SmacrossError::NoData {
                    symbol: "BTC".into(),
                },
                ExitCode::from(5),
            ),
            (
                SmacrossError::Report {
                    reason: "disk full".into(),
                },
                ExitCode::from(1),
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(
                format!("{:?}", ExitCode::from(&err)),
                format!("{:?}", expected)
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SmacrossError = io.into();
        assert!(matches!(err, SmacrossError::Io(_)));
    }
}
