//! The analysis pipeline.
//!
//! ```text
//! RawMarket ──normalize_all──▶ MarketRecord
//!                                 │
//!                    RelationshipFinder (oracle batches)
//!                                 │
//!                                 ▼
//!                          RelationshipEdge ──build_groups──▶ OpportunityGroup
//!                                                                  │
//!                                                             evaluate_all
//!                                                                  │
//!                                                                  ▼
//!                          ArbitrageSignal ◀──────rank────── GroupEvaluation
//! ```
//!
//! Each stage takes read-only input and returns a new collection, so every
//! stage can also be called on its own.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::application::config::AnalysisConfig;
use crate::application::constraint::{evaluate_all, PriceBook};
use crate::application::graph::build_groups;
use crate::application::ingest::normalize_all;
use crate::application::oracle::RelationshipFinder;
use crate::application::ranker::rank;
use crate::application::report::{AnalysisReport, SkipSummary};
use crate::domain::market::RawMarket;
use crate::error::Result;
use crate::port::outbound::oracle::RelationOracle;

/// One-shot batch pipeline from raw listings to ranked signals.
pub struct Pipeline {
    finder: RelationshipFinder,
    config: AnalysisConfig,
}

impl Pipeline {
    /// Create a pipeline over an oracle with explicit configuration.
    pub fn new(oracle: Arc<dyn RelationOracle>, config: AnalysisConfig) -> Self {
        Self {
            finder: RelationshipFinder::new(oracle),
            config,
        }
    }

    /// Configuration threaded through every stage.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage over a snapshot of raw listings.
    ///
    /// Record, batch and group failures are isolated and counted in the
    /// report. Cancelling `cancel` stops the oracle stage early; the run
    /// still completes with the edges gathered so far.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, before any processing, when the
    /// analysis thresholds are invalid.
    pub async fn run(
        &self,
        raw: Vec<RawMarket>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let total_markets = raw.len();
        let mut warnings = Vec::new();

        let (markets, rejections) = normalize_all(raw);
        for rejection in &rejections {
            warnings.push(format!("record {}: {}", rejection.index, rejection.error));
        }

        let oracle = self
            .finder
            .find_relationships(&markets, &self.config, cancel)
            .await;
        for failure in &oracle.failures {
            warnings.push(format!(
                "oracle batch {} failed after {} attempts: {}",
                failure.batch, failure.attempts, failure.error
            ));
        }
        if oracle.was_cancelled() {
            warnings.push(format!(
                "run cancelled, {} oracle batches not completed",
                oracle.cancelled_batches
            ));
        }

        let graph = build_groups(
            &markets,
            &oracle.edges,
            self.config.min_edge_confidence,
            self.config.max_group_size,
        );

        let prices = PriceBook::from_markets(&markets);
        let (evaluations, unsupported) = evaluate_all(&graph.groups, &prices);
        warnings.extend(unsupported.iter().map(ToString::to_string));

        let ranked = rank(evaluations, &self.config);

        let skipped = SkipSummary {
            invalid_records: rejections.len(),
            failed_batches: oracle.failures.len(),
            cancelled_batches: oracle.cancelled_batches,
            dropped_oracle_edges: oracle.dropped_edges,
            discarded_edges: graph.discarded.total(),
            unsupported_groups: unsupported.len(),
            oversized_groups: graph.oversized(),
            filtered_signals: ranked.filtered,
            deduplicated_signals: ranked.deduplicated,
        };

        info!(
            run_id = %run_id,
            markets = total_markets,
            valid = markets.len(),
            edges = graph.retained_edges,
            groups = graph.groups.len(),
            signals = ranked.signals.len(),
            invalid_records = skipped.invalid_records,
            failed_batches = skipped.failed_batches,
            unsupported_groups = skipped.unsupported_groups,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            oracle: self.finder.oracle_name().to_string(),
            total_markets,
            valid_markets: markets.len(),
            batches: oracle.batches,
            retained_edges: graph.retained_edges,
            groups: graph.groups.len(),
            signals: ranked.signals,
            skipped,
            warnings,
            rejections,
        })
    }
}
