//! Relationship discovery through the oracle port.
//!
//! [`RelationshipFinder`] partitions markets into batches, dispatches them
//! with bounded concurrency, retries failures with backoff, and validates
//! every returned tuple before it becomes a [`RelationshipEdge`].
//!
//! A batch that keeps failing degrades to no edges and is reported in
//! [`OracleOutcome::failures`]; the run always continues.

mod retry;

pub use retry::Backoff;

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::config::AnalysisConfig;
use crate::domain::id::MarketId;
use crate::domain::market::MarketRecord;
use crate::domain::relation::{RelationKind, RelationshipEdge};
use crate::error::OracleError;
use crate::port::outbound::oracle::{MarketSummary, OracleEdge, RelationOracle};

/// A batch that still failed after all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleBatchError {
    /// Batch index in dispatch order.
    pub batch: usize,
    /// Number of calls made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub error: OracleError,
}

/// Merged result of all oracle batches.
#[derive(Debug, Clone, Default)]
pub struct OracleOutcome {
    /// Validated edges in batch order.
    pub edges: Vec<RelationshipEdge>,
    /// Number of batches planned (singletons excluded).
    pub batches: usize,
    /// Batches that failed after retries.
    pub failures: Vec<OracleBatchError>,
    /// Tuples rejected by response validation.
    pub dropped_edges: usize,
    /// Batches abandoned because the run was cancelled.
    pub cancelled_batches: usize,
}

impl OracleOutcome {
    /// True when cancellation cut the oracle stage short.
    #[must_use]
    pub const fn was_cancelled(&self) -> bool {
        self.cancelled_batches > 0
    }
}

enum BatchReport {
    Completed { batch: usize, tuples: Vec<OracleEdge> },
    Failed(OracleBatchError),
    Cancelled { batch: usize },
}

impl BatchReport {
    const fn batch(&self) -> usize {
        match self {
            Self::Completed { batch, .. } | Self::Cancelled { batch } => *batch,
            Self::Failed(e) => e.batch,
        }
    }
}

/// Discovers relationship edges among markets using a [`RelationOracle`].
pub struct RelationshipFinder {
    oracle: Arc<dyn RelationOracle>,
}

impl RelationshipFinder {
    /// Create a finder over the given oracle.
    pub fn new(oracle: Arc<dyn RelationOracle>) -> Self {
        Self { oracle }
    }

    /// Name of the underlying oracle.
    #[must_use]
    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    /// Effective batch size: the configured size capped by the oracle's limit.
    #[must_use]
    pub fn batch_size(&self, config: &AnalysisConfig) -> usize {
        config
            .oracle_batch_size
            .min(self.oracle.batch_limit())
            .max(2)
    }

    /// Find relationship edges among `markets`.
    ///
    /// Never fails: batch errors are retried, then recorded in the outcome.
    /// When `cancel` fires, no new batches are dispatched, in-flight calls
    /// are abandoned, and the edges of completed batches are returned.
    pub async fn find_relationships(
        &self,
        markets: &[MarketRecord],
        config: &AnalysisConfig,
        cancel: &CancellationToken,
    ) -> OracleOutcome {
        let summaries: Vec<MarketSummary> = markets.iter().map(MarketSummary::from).collect();
        let batches = partition(summaries, self.batch_size(config));

        info!(
            oracle = self.oracle.name(),
            markets = markets.len(),
            batches = batches.len(),
            max_in_flight = config.max_in_flight_batches,
            "Dispatching oracle batches"
        );

        let mut reports: Vec<BatchReport> = stream::iter(batches.iter().enumerate())
            .map(|(index, batch)| self.run_batch(index, batch, config, cancel))
            .buffer_unordered(config.max_in_flight_batches.max(1))
            .collect()
            .await;
        reports.sort_by_key(BatchReport::batch);

        let mut outcome = OracleOutcome {
            batches: batches.len(),
            ..Default::default()
        };

        for report in reports {
            match report {
                BatchReport::Completed { batch, tuples } => {
                    let known: HashSet<&str> =
                        batches[batch].iter().map(|m| m.id.as_str()).collect();
                    for tuple in tuples {
                        match validate(tuple, &known, config) {
                            Ok(edge) => outcome.edges.push(edge),
                            Err(reason) => {
                                warn!(batch, reason = %reason, "Dropped oracle edge");
                                outcome.dropped_edges += 1;
                            }
                        }
                    }
                }
                BatchReport::Failed(failure) => outcome.failures.push(failure),
                BatchReport::Cancelled { .. } => outcome.cancelled_batches += 1,
            }
        }

        info!(
            edges = outcome.edges.len(),
            failed_batches = outcome.failures.len(),
            dropped_edges = outcome.dropped_edges,
            cancelled_batches = outcome.cancelled_batches,
            "Oracle stage complete"
        );
        outcome
    }

    async fn run_batch(
        &self,
        batch: usize,
        markets: &[MarketSummary],
        config: &AnalysisConfig,
        cancel: &CancellationToken,
    ) -> BatchReport {
        if cancel.is_cancelled() {
            return BatchReport::Cancelled { batch };
        }

        let max_attempts = config.max_retries.saturating_add(1);
        let mut backoff = Backoff::from_config(config);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let call = tokio::time::timeout(config.batch_timeout(), self.oracle.relate(markets));
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return BatchReport::Cancelled { batch },
                result = call => result,
            };

            let error = match result {
                Ok(Ok(tuples)) => {
                    debug!(batch, attempts, tuples = tuples.len(), "Oracle batch complete");
                    return BatchReport::Completed { batch, tuples };
                }
                Ok(Err(e)) => e.into_oracle_error(),
                Err(_) => OracleError::Timeout {
                    timeout_ms: config.batch_timeout_ms,
                },
            };

            if attempts >= max_attempts {
                warn!(batch, attempts, error = %error, "Oracle batch failed, skipping");
                return BatchReport::Failed(OracleBatchError {
                    batch,
                    attempts,
                    error,
                });
            }

            let delay = backoff.next_delay();
            debug!(
                batch,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Oracle batch failed, retrying"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => return BatchReport::Cancelled { batch },
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Split summaries into near-equal batches of at most `size` markets.
///
/// Balancing the split means no batch is left with a single market unless
/// the whole input is a single market, which is not dispatched at all.
fn partition(summaries: Vec<MarketSummary>, size: usize) -> Vec<Vec<MarketSummary>> {
    let total = summaries.len();
    if total < 2 {
        return Vec::new();
    }
    let size = size.max(2);
    let count = total.div_ceil(size);
    let base = total / count;
    let extra = total % count;

    let mut batches = Vec::with_capacity(count);
    let mut iter = summaries.into_iter();
    for i in 0..count {
        let len = base + usize::from(i < extra);
        batches.push(iter.by_ref().take(len).collect());
    }
    batches
}

/// Turn one untrusted tuple into an edge, or explain why it was dropped.
fn validate(
    tuple: OracleEdge,
    known: &HashSet<&str>,
    config: &AnalysisConfig,
) -> Result<RelationshipEdge, String> {
    let a = tuple.a.trim();
    let b = tuple.b.trim();
    if !known.contains(a) {
        return Err(format!("unknown market {a}"));
    }
    if !known.contains(b) {
        return Err(format!("unknown market {b}"));
    }
    if a == b {
        return Err(format!("self-referencing edge on {a}"));
    }

    let kind: RelationKind = tuple
        .label
        .parse()
        .map_err(|e| format!("{e} between {a} and {b}"))?;

    let confidence = tuple.confidence.unwrap_or_else(|| config.missing_confidence());
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!("confidence {confidence} out of range between {a} and {b}"));
    }

    Ok(
        RelationshipEdge::new(MarketId::new(a), MarketId::new(b), kind, confidence)
            .with_reasoning(tuple.reasoning),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit;
    use crate::testkit::oracle::{ScriptedOracle, StaticOracle};
    use std::time::Duration;

    fn markets(n: usize) -> Vec<MarketRecord> {
        (0..n)
            .map(|i| testkit::domain::binary_market(&format!("m{i}"), rust_decimal_macros::dec!(0.5)))
            .collect()
    }

    fn summary(id: &str) -> MarketSummary {
        MarketSummary::new(MarketId::new(id), "q", vec!["Yes".into(), "No".into()])
    }

    #[test]
    fn partition_balances_batches() {
        let summaries: Vec<_> = (0..31).map(|i| summary(&format!("m{i}"))).collect();
        let sizes: Vec<usize> = partition(summaries, 30).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![16, 15]);
    }

    #[test]
    fn partition_skips_single_market() {
        assert!(partition(vec![summary("m0")], 30).is_empty());
        assert!(partition(Vec::new(), 30).is_empty());
    }

    #[test]
    fn partition_respects_limit() {
        let summaries: Vec<_> = (0..10).map(|i| summary(&format!("m{i}"))).collect();
        let batches = partition(summaries, 3);
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() <= 3 && b.len() >= 2));
    }

    #[test]
    fn validate_rejects_unknown_ids_and_bad_confidence() {
        let config = AnalysisConfig::default();
        let known: HashSet<&str> = ["a", "b"].into_iter().collect();

        assert!(validate(OracleEdge::new("a", "zz", "complement", Some(0.9)), &known, &config).is_err());
        assert!(validate(OracleEdge::new("a", "b", "complement", Some(1.5)), &known, &config).is_err());
        assert!(validate(OracleEdge::new("a", "b", "complement", Some(f64::NAN)), &known, &config).is_err());
        assert!(validate(OracleEdge::new("a", "a", "complement", Some(0.9)), &known, &config).is_err());
        assert!(validate(OracleEdge::new("a", "b", "sibling", Some(0.9)), &known, &config).is_err());
    }

    #[test]
    fn validate_defaults_missing_confidence() {
        let config = AnalysisConfig {
            default_confidence: Some(0.75),
            ..Default::default()
        };
        let known: HashSet<&str> = ["a", "b"].into_iter().collect();

        let edge = validate(OracleEdge::new("a", "b", "EQUIVALENT", None), &known, &config).unwrap();
        assert_eq!(edge.kind, RelationKind::Equivalent);
        assert!((edge.confidence - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn batches_are_capped_by_oracle_limit() {
        let oracle = Arc::new(StaticOracle::new(Vec::new()).with_batch_limit(4));
        let finder = RelationshipFinder::new(oracle.clone());
        let config = testkit::config::analysis_config();

        let outcome = finder
            .find_relationships(&markets(10), &config, &CancellationToken::new())
            .await;

        assert_eq!(outcome.batches, 3);
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn edges_outside_the_batch_are_dropped() {
        let oracle = Arc::new(ScriptedOracle::new().with_script(
            "m0",
            vec![Ok(vec![
                OracleEdge::new("m0", "m1", "complement", Some(0.9)),
                OracleEdge::new("m0", "ghost", "complement", Some(0.9)),
                OracleEdge::new("m0", "m1", "equivalent", Some(7.0)),
            ])],
        ));
        let finder = RelationshipFinder::new(oracle);
        let config = testkit::config::analysis_config();

        let outcome = finder
            .find_relationships(&markets(2), &config, &CancellationToken::new())
            .await;

        assert_eq!(outcome.edges.len(), 1);
        assert_eq!(outcome.dropped_edges, 2);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let oracle = Arc::new(ScriptedOracle::new().with_script(
            "m0",
            vec![
                Err(Error::Connection("reset".into())),
                Ok(vec![OracleEdge::new("m0", "m1", "equivalent", Some(0.8))]),
            ],
        ));
        let finder = RelationshipFinder::new(oracle.clone());
        let config = testkit::config::analysis_config();

        let outcome = finder
            .find_relationships(&markets(2), &config, &CancellationToken::new())
            .await;

        assert_eq!(oracle.calls(), 2);
        assert_eq!(outcome.edges.len(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn exhausted_batch_degrades_to_no_edges() {
        let oracle = Arc::new(ScriptedOracle::new().with_script(
            "m0",
            vec![
                Err(Error::Parse("no JSON".into())),
                Err(Error::Parse("no JSON".into())),
                Err(Error::Parse("no JSON".into())),
            ],
        ));
        let finder = RelationshipFinder::new(oracle.clone());
        let config = AnalysisConfig {
            max_retries: 2,
            ..testkit::config::analysis_config()
        };

        let outcome = finder
            .find_relationships(&markets(2), &config, &CancellationToken::new())
            .await;

        assert_eq!(oracle.calls(), 3);
        assert!(outcome.edges.is_empty());
        assert_eq!(
            outcome.failures,
            vec![OracleBatchError {
                batch: 0,
                attempts: 3,
                error: OracleError::Malformed("no JSON".into()),
            }]
        );
    }

    #[tokio::test]
    async fn slow_batch_times_out() {
        let oracle = Arc::new(ScriptedOracle::new().with_delay(Duration::from_millis(200)));
        let finder = RelationshipFinder::new(oracle);
        let config = AnalysisConfig {
            batch_timeout_ms: 10,
            max_retries: 0,
            ..testkit::config::analysis_config()
        };

        let outcome = finder
            .find_relationships(&markets(2), &config, &CancellationToken::new())
            .await;

        assert_eq!(
            outcome.failures[0].error,
            OracleError::Timeout { timeout_ms: 10 }
        );
    }

    #[tokio::test]
    async fn cancelled_run_dispatches_nothing() {
        let oracle = Arc::new(StaticOracle::new(Vec::new()));
        let finder = RelationshipFinder::new(oracle.clone());
        let config = testkit::config::analysis_config();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = finder.find_relationships(&markets(4), &config, &cancel).await;

        assert_eq!(oracle.calls(), 0);
        assert!(outcome.was_cancelled());
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn edges_merge_in_batch_order() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .with_script(
                    "m0",
                    vec![Ok(vec![OracleEdge::new("m0", "m1", "complement", Some(0.9))])],
                )
                .with_script(
                    "m2",
                    vec![Ok(vec![OracleEdge::new("m2", "m3", "complement", Some(0.9))])],
                ),
        );
        let finder = RelationshipFinder::new(oracle);
        let config = AnalysisConfig {
            oracle_batch_size: 2,
            ..testkit::config::analysis_config()
        };

        let outcome = finder
            .find_relationships(&markets(4), &config, &CancellationToken::new())
            .await;

        let sources: Vec<&str> = outcome.edges.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["m0", "m2"]);
    }
}
