//! Pipeline runs over in-memory listings and mock oracles.

use std::sync::Arc;

use tangle::application::{AnalysisConfig, AnalysisReport, Pipeline};
use tangle::domain::RawMarket;
use tangle::port::{OracleEdge, RelationOracle};
use tangle::testkit::domain::raw_binary;
use tokio_util::sync::CancellationToken;

/// Raw binary listings from `(id, P(YES))` pairs.
pub fn listings(prices: &[(&str, f64)]) -> Vec<RawMarket> {
    prices.iter().map(|(id, yes)| raw_binary(id, *yes)).collect()
}

pub fn oracle_edge(a: &str, b: &str, label: &str, confidence: f64) -> OracleEdge {
    OracleEdge::new(a, b, label, Some(confidence))
}

/// Run the full pipeline once to completion.
pub async fn run(
    oracle: Arc<dyn RelationOracle>,
    config: AnalysisConfig,
    raw: Vec<RawMarket>,
) -> AnalysisReport {
    Pipeline::new(oracle, config)
        .run(raw, &CancellationToken::new())
        .await
        .expect("pipeline run")
}
