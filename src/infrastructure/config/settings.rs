//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; provider API keys come from
//! the environment only.
//!
//! # Example
//!
//! ```no_run
//! use tangle::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::llm::LlmConfig;
use super::logging::LoggingConfig;
use super::source::SourceConfig;
use crate::application::config::AnalysisConfig;
use crate::error::{ConfigError, Result};

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Parse configuration from TOML content and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.llm.validate()?;
        self.source.validate()?;
        self.analysis.validate()?;
        Ok(())
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infrastructure::config::llm::LlmProvider;
    use crate::infrastructure::config::source::SourceKind;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.max_group_size, 8);
    }

    #[test]
    fn parses_full_config() {
        let config = Config::parse_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [llm]
            provider = "anthropic"

            [llm.anthropic]
            model = "claude-test"

            [source]
            kind = "clob"
            required_tags = ["Politics", "Ukraine"]
            max_markets = 200

            [analysis]
            min_edge_confidence = 0.8
            min_deviation = 0.03
            oracle_batch_size = 20
            max_in_flight_batches = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.llm.anthropic.model, "claude-test");
        assert_eq!(config.source.kind, SourceKind::Clob);
        assert_eq!(config.source.max_markets, Some(200));
        assert_eq!(config.analysis.min_deviation, dec!(0.03));
        assert_eq!(config.analysis.oracle_batch_size, 20);
    }

    #[test]
    fn invalid_threshold_is_fatal() {
        let result = Config::parse_toml(
            r#"
            [analysis]
            min_edge_confidence = -0.2
            "#,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "min_edge_confidence",
                ..
            }))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            Config::parse_toml("[analysis"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Config::parse_toml("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(matches!(
            Config::load("/nonexistent/tangle.toml"),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }
}
