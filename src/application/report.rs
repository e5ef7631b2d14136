//! Analysis report produced by one pipeline run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::ingest::RecordRejection;
use crate::domain::signal::ArbitrageSignal;

/// Counts of everything excluded along the way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipSummary {
    /// Raw listings that failed normalization.
    pub invalid_records: usize,
    /// Oracle batches that failed after retries.
    pub failed_batches: usize,
    /// Oracle batches abandoned on cancellation.
    pub cancelled_batches: usize,
    /// Oracle tuples rejected by response validation.
    pub dropped_oracle_edges: usize,
    /// Edges removed by the graph builder (type, confidence, conflicts).
    pub discarded_edges: usize,
    /// Groups without a derivable constraint.
    pub unsupported_groups: usize,
    /// Groups above the soft size limit (still evaluated).
    pub oversized_groups: usize,
    /// Evaluations below the deviation threshold.
    pub filtered_signals: usize,
    /// Evaluations dropped as duplicate member sets.
    pub deduplicated_signals: usize,
}

impl SkipSummary {
    /// True when nothing was skipped, dropped or cancelled.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.invalid_records == 0
            && self.failed_batches == 0
            && self.cancelled_batches == 0
            && self.dropped_oracle_edges == 0
            && self.unsupported_groups == 0
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Oracle used for relationship detection.
    pub oracle: String,
    /// Raw listings received.
    pub total_markets: usize,
    /// Listings that passed normalization.
    pub valid_markets: usize,
    /// Oracle batches planned.
    pub batches: usize,
    /// Edges retained for grouping.
    pub retained_edges: usize,
    /// Opportunity groups built.
    pub groups: usize,
    /// Ranked signals, highest materiality first.
    pub signals: Vec<ArbitrageSignal>,
    /// What was skipped and how often.
    pub skipped: SkipSummary,
    /// Human-readable reasons for skipped records, batches and groups.
    pub warnings: Vec<String>,
    /// Listings rejected during normalization.
    pub rejections: Vec<RecordRejection>,
}

impl AnalysisReport {
    /// File name used when the report is saved.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "arbitrage_analysis_{}.json",
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// True when the oracle stage was cut short by cancellation.
    #[must_use]
    pub const fn was_cancelled(&self) -> bool {
        self.skipped.cancelled_batches > 0
    }
}
