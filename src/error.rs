use thiserror::Error;

use crate::domain::error::{EvaluationError, ValidationError};

/// Configuration-related errors with structured variants.
///
/// These are the only failures that abort a run; they are raised before
/// any market is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failure of a single relationship-oracle call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("oracle service error: {0}")]
    Service(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Collapse any error raised inside an oracle call into an [`OracleError`].
    ///
    /// Transport failures become `Service`, decoding failures become
    /// `Malformed`; an error that already is an `OracleError` is kept.
    #[must_use]
    pub fn into_oracle_error(self) -> OracleError {
        match self {
            Self::Oracle(e) => e,
            Self::Json(e) => OracleError::Malformed(e.to_string()),
            Self::Parse(msg) => OracleError::Malformed(msg),
            other => OracleError::Service(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_map_to_malformed() {
        let err = Error::Parse("No JSON found in response".into());
        assert_eq!(
            err.into_oracle_error(),
            OracleError::Malformed("No JSON found in response".into())
        );
    }

    #[test]
    fn connection_errors_map_to_service() {
        let err = Error::Connection("502 Bad Gateway".into());
        assert!(matches!(err.into_oracle_error(), OracleError::Service(_)));
    }

    #[test]
    fn oracle_errors_pass_through() {
        let err = Error::Oracle(OracleError::Timeout { timeout_ms: 10 });
        assert_eq!(err.into_oracle_error(), OracleError::Timeout { timeout_ms: 10 });
    }

    #[test]
    fn config_error_display_names_field() {
        let err = ConfigError::InvalidValue {
            field: "min_deviation",
            reason: "must be between 0 and 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for min_deviation: must be between 0 and 1"
        );
    }
}
