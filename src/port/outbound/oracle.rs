//! Relationship oracle port.
//!
//! Defines the request/response contract of the external service that
//! judges whether market questions are logically related. The oracle is
//! untrusted: its answers are loosely typed here and validated by the
//! application layer before they become [`RelationshipEdge`]s.
//!
//! [`RelationshipEdge`]: crate::domain::relation::RelationshipEdge

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::id::MarketId;
use crate::domain::market::MarketRecord;
use crate::error::Result;

/// Minimal market information sent to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    /// Unique market identifier.
    pub id: MarketId,
    /// Human-readable market question.
    pub question: String,
    /// Resolution description, if the venue provides one.
    pub description: Option<String>,
    /// Resolution date, if known.
    pub end_date: Option<String>,
    /// Venue category, if any.
    pub category: Option<String>,
    /// Venue tags.
    pub tags: Vec<String>,
    /// Outcome names (e.g., ["Yes", "No"]).
    pub outcomes: Vec<String>,
}

impl MarketSummary {
    /// Create a new market summary.
    #[must_use]
    pub fn new(id: MarketId, question: impl Into<String>, outcomes: Vec<String>) -> Self {
        Self {
            id,
            question: question.into(),
            description: None,
            end_date: None,
            category: None,
            tags: Vec::new(),
            outcomes,
        }
    }
}

impl From<&MarketRecord> for MarketSummary {
    fn from(market: &MarketRecord) -> Self {
        Self {
            id: market.id().clone(),
            question: market.question().to_string(),
            description: market.description().map(str::to_string),
            end_date: market.end_date().map(str::to_string),
            category: market.category().map(str::to_string),
            tags: market.tags().to_vec(),
            outcomes: market
                .outcome_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One relationship tuple as returned by the oracle, before validation.
///
/// Unknown fields in the payload are ignored; a missing confidence stays
/// `None` and is defaulted by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OracleEdge {
    /// First market identifier (implying market for subset edges).
    #[serde(alias = "market_a", alias = "if_yes")]
    pub a: String,
    /// Second market identifier (implied market for subset edges).
    #[serde(alias = "market_b", alias = "then_yes")]
    pub b: String,
    /// Relationship type label.
    #[serde(rename = "type", alias = "relationship_type", alias = "kind")]
    pub label: String,
    /// Confidence in `[0, 1]`, if supplied.
    #[serde(default, alias = "confidence_score")]
    pub confidence: Option<f64>,
    /// Free-text justification.
    #[serde(default, alias = "explanation")]
    pub reasoning: String,
}

impl OracleEdge {
    /// Create a tuple with an explicit confidence.
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        label: impl Into<String>,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            label: label.into(),
            confidence,
            reasoning: String::new(),
        }
    }
}

/// External judge of semantic relationships between markets.
///
/// Each call is idempotent and side-effect free from the pipeline's point
/// of view, which lets the caller retry and run batches concurrently.
///
/// # Errors
///
/// [`relate`](Self::relate) fails for transport errors and for responses
/// that cannot be parsed at all. Individually bad tuples are returned and
/// filtered by the caller.
#[async_trait]
pub trait RelationOracle: Send + Sync {
    /// Return the oracle name for logging.
    fn name(&self) -> &'static str;

    /// Judge relationships among one batch of markets.
    async fn relate(&self, batch: &[MarketSummary]) -> Result<Vec<OracleEdge>>;

    /// Maximum number of markets the backend accepts per call.
    ///
    /// The effective batch size is the smaller of this and the configured
    /// `oracle_batch_size`. Default is 30.
    fn batch_limit(&self) -> usize {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_edge_accepts_aliases_and_ignores_extras() {
        let edge: OracleEdge = serde_json::from_str(
            r#"{"market_a": "m1", "market_b": "m2", "relationship_type": "complement",
                "confidence_score": 0.8, "potential_arbitrage": true}"#,
        )
        .unwrap();
        assert_eq!(edge.a, "m1");
        assert_eq!(edge.b, "m2");
        assert_eq!(edge.label, "complement");
        assert_eq!(edge.confidence, Some(0.8));
    }

    #[test]
    fn summary_carries_venue_context() {
        let raw = crate::domain::market::RawMarket {
            description: Some("Resolves on the official count.".into()),
            category: Some("Politics".into()),
            tags: vec!["Elections".into()],
            ..crate::testkit::domain::raw_binary("m1", 0.4)
        };
        let market = MarketRecord::normalize(raw).unwrap();

        let summary = MarketSummary::from(&market);

        assert_eq!(summary.category.as_deref(), Some("Politics"));
        assert_eq!(summary.tags, vec!["Elections".to_string()]);
        assert_eq!(summary.description.as_deref(), Some("Resolves on the official count."));
    }

    #[test]
    fn oracle_edge_missing_confidence_is_none() {
        let edge: OracleEdge =
            serde_json::from_str(r#"{"a": "m1", "b": "m2", "type": "equivalent"}"#).unwrap();
        assert_eq!(edge.confidence, None);
        assert!(edge.reasoning.is_empty());
    }
}
