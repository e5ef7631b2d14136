//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::application::config::AnalysisConfig;

/// Analysis config with zero retry delays, so tests never sleep.
///
/// Thresholds keep their production defaults.
pub fn analysis_config() -> AnalysisConfig {
    AnalysisConfig {
        retry_initial_delay_ms: 0,
        retry_max_delay_ms: 0,
        retry_backoff_multiplier: 1.0,
        batch_timeout_ms: 5_000,
        ..AnalysisConfig::default()
    }
}

/// Fast analysis config with the given thresholds.
pub fn thresholds(min_edge_confidence: f64, min_deviation: rust_decimal::Decimal) -> AnalysisConfig {
    AnalysisConfig {
        min_edge_confidence,
        min_deviation,
        ..analysis_config()
    }
}
