//! Analysis pipeline configuration.
//!
//! Every threshold the pipeline consumes lives here and is threaded
//! explicitly through each stage's entry point.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Edges below this confidence are discarded before grouping (0.0 to 1.0).
    #[serde(default = "default_min_edge_confidence")]
    pub min_edge_confidence: f64,
    /// Groups whose |deviation| falls below this are not reported (0.0 to 1.0).
    #[serde(default = "default_min_deviation")]
    pub min_deviation: Decimal,
    /// Maximum number of markets per oracle request.
    #[serde(default = "default_oracle_batch_size")]
    pub oracle_batch_size: usize,
    /// Maximum number of oracle requests in flight at once.
    #[serde(default = "default_max_in_flight_batches")]
    pub max_in_flight_batches: usize,
    /// Retries per batch after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Soft limit on group size; larger groups are flagged, not truncated.
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,
    /// Confidence given to oracle tuples that omit one.
    ///
    /// Defaults to `min_edge_confidence` when unset.
    #[serde(default)]
    pub default_confidence: Option<f64>,
    /// Per-call timeout for oracle requests (milliseconds).
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,
    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: f64,
    /// Upper bound on the retry delay (milliseconds).
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Weight materiality by the group's weakest edge confidence.
    #[serde(default = "default_confidence_weighted")]
    pub confidence_weighted: bool,
    /// Materiality multiplier for oversized groups, in `(0, 1]`.
    #[serde(default = "default_oversized_group_penalty")]
    pub oversized_group_penalty: Decimal,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_edge_confidence: default_min_edge_confidence(),
            min_deviation: default_min_deviation(),
            oracle_batch_size: default_oracle_batch_size(),
            max_in_flight_batches: default_max_in_flight_batches(),
            max_retries: default_max_retries(),
            max_group_size: default_max_group_size(),
            default_confidence: None,
            batch_timeout_ms: default_batch_timeout_ms(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_backoff_multiplier: default_retry_backoff_multiplier(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            confidence_weighted: default_confidence_weighted(),
            oversized_group_penalty: default_oversized_group_penalty(),
        }
    }
}

impl AnalysisConfig {
    /// Confidence assigned to oracle tuples without one.
    #[must_use]
    pub fn missing_confidence(&self) -> f64 {
        self.default_confidence.unwrap_or(self.min_edge_confidence)
    }

    /// Per-call oracle timeout.
    #[must_use]
    pub const fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    /// Validate threshold values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !unit_interval(self.min_edge_confidence) {
            return Err(invalid("min_edge_confidence", "must be between 0 and 1"));
        }
        if self.min_deviation < Decimal::ZERO || self.min_deviation > Decimal::ONE {
            return Err(invalid("min_deviation", "must be between 0 and 1"));
        }
        if let Some(confidence) = self.default_confidence {
            if !unit_interval(confidence) {
                return Err(invalid("default_confidence", "must be between 0 and 1"));
            }
        }
        if self.oracle_batch_size < 2 {
            return Err(invalid("oracle_batch_size", "must be at least 2"));
        }
        if self.max_in_flight_batches == 0 {
            return Err(invalid("max_in_flight_batches", "must be greater than 0"));
        }
        if self.max_group_size < 2 {
            return Err(invalid("max_group_size", "must be at least 2"));
        }
        if self.batch_timeout_ms == 0 {
            return Err(invalid("batch_timeout_ms", "must be greater than 0"));
        }
        if !(self.retry_backoff_multiplier >= 1.0) {
            return Err(invalid("retry_backoff_multiplier", "must be >= 1.0"));
        }
        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            return Err(invalid(
                "retry_max_delay_ms",
                "must be >= retry_initial_delay_ms",
            ));
        }
        if self.oversized_group_penalty <= Decimal::ZERO
            || self.oversized_group_penalty > Decimal::ONE
        {
            return Err(invalid("oversized_group_penalty", "must be in (0, 1]"));
        }
        Ok(())
    }
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

const fn default_min_edge_confidence() -> f64 {
    0.7
}

fn default_min_deviation() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

const fn default_oracle_batch_size() -> usize {
    30
}

const fn default_max_in_flight_batches() -> usize {
    4
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_max_group_size() -> usize {
    8
}

const fn default_batch_timeout_ms() -> u64 {
    60_000
}

const fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_retry_backoff_multiplier() -> f64 {
    2.0
}

const fn default_retry_max_delay_ms() -> u64 {
    8_000
}

const fn default_confidence_weighted() -> bool {
    true
}

fn default_oversized_group_penalty() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_deviation, dec!(0.02));
        assert_eq!(config.oracle_batch_size, 30);
    }

    #[test]
    fn missing_confidence_falls_back_to_threshold() {
        let config = AnalysisConfig::default();
        assert!((config.missing_confidence() - 0.7).abs() < f64::EPSILON);

        let config = AnalysisConfig {
            default_confidence: Some(0.5),
            ..Default::default()
        };
        assert!((config.missing_confidence() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_confidence_bound_is_rejected() {
        let config = AnalysisConfig {
            min_edge_confidence: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "min_edge_confidence",
                ..
            })
        ));
    }

    #[test]
    fn nan_confidence_bound_is_rejected() {
        let config = AnalysisConfig {
            min_edge_confidence: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deviation_above_one_is_rejected() {
        let config = AnalysisConfig {
            min_deviation: dec!(1.5),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "min_deviation",
                ..
            })
        ));
    }

    #[test]
    fn zero_in_flight_is_rejected() {
        let config = AnalysisConfig {
            max_in_flight_batches: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn penalty_must_be_positive() {
        let config = AnalysisConfig {
            oversized_group_penalty: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: AnalysisConfig = toml::from_str("min_deviation = 0.05").unwrap();
        assert_eq!(config.min_deviation, dec!(0.05));
        assert_eq!(config.max_retries, 2);
    }
}
