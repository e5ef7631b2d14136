//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`RawMarket`], [`MarketRecord`]
//! and [`RelationshipEdge`] so tests focus on assertions rather than
//! construction boilerplate.

use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::{MarketId, MarketRecord, Outcome, RawMarket, RelationKind, RelationshipEdge};

/// Create a [`MarketId`] from a string.
pub fn market_id(id: &str) -> MarketId {
    MarketId::new(id)
}

/// Binary YES/NO market with `NO = 1 - YES`.
pub fn binary_market(id: &str, yes: Decimal) -> MarketRecord {
    MarketRecord::try_new(
        MarketId::new(id),
        format!("Will {id} happen?"),
        vec![
            Outcome::new("Yes", yes),
            Outcome::new("No", Decimal::ONE - yes),
        ],
    )
    .expect("valid test market")
}

/// Generate `n` binary markets named `m0`, `m1`, ... all priced at `yes`.
pub fn make_markets(n: usize, yes: Decimal) -> Vec<MarketRecord> {
    (0..n).map(|i| binary_market(&format!("m{i}"), yes)).collect()
}

/// Raw binary listing as a market source would supply it.
pub fn raw_binary(id: &str, yes: f64) -> RawMarket {
    RawMarket {
        id: Some(id.to_string()),
        question: Some(format!("Will {id} happen?")),
        outcomes: vec!["Yes".into(), "No".into()],
        prices: [
            ("Yes".to_string(), json!(yes)),
            ("No".to_string(), json!(format!("{:.4}", 1.0 - yes))),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    }
}

/// Relationship edge without reasoning.
pub fn edge(source: &str, target: &str, kind: RelationKind, confidence: f64) -> RelationshipEdge {
    RelationshipEdge::new(MarketId::new(source), MarketId::new(target), kind, confidence)
}
