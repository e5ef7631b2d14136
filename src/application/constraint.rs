//! No-arbitrage constraint evaluation.
//!
//! Each retained edge implies a constraint on the YES probabilities of its
//! two markets:
//!
//! | Relationship      | Constraint        | Deviation              |
//! |-------------------|-------------------|------------------------|
//! | Complement (A, B) | P(A) + P(B) = 1   | P(A) + P(B) - 1        |
//! | Equivalent (A, B) | P(A) = P(B)       | P(A) - P(B)            |
//! | Subset (A => B)   | P(A) <= P(B)      | max(0, P(A) - P(B))    |
//!
//! Groups larger than a pair are checked edge by edge; the edge with the
//! largest magnitude drives the reported deviation and the sum of
//! magnitudes is kept as a secondary figure. Evaluation is a pure function
//! of the prices and the group.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::error::EvaluationError;
use crate::domain::group::{Composition, OpportunityGroup};
use crate::domain::id::MarketId;
use crate::domain::market::MarketRecord;
use crate::domain::relation::{RelationKind, RelationshipEdge};
use crate::domain::signal::{GroupEvaluation, PairDeviation};

/// YES probabilities by market, resolved once per run.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    yes: HashMap<MarketId, Decimal>,
}

impl PriceBook {
    /// Index the YES probability of every market.
    #[must_use]
    pub fn from_markets(markets: &[MarketRecord]) -> Self {
        let yes = markets
            .iter()
            .filter_map(|m| m.yes_probability().map(|p| (m.id().clone(), p)))
            .collect();
        Self { yes }
    }

    /// YES probability of a market.
    #[must_use]
    pub fn yes(&self, market: &MarketId) -> Option<Decimal> {
        self.yes.get(market).copied()
    }

    /// Number of priced markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.yes.len()
    }

    /// True when no market is priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.yes.is_empty()
    }
}

/// Evaluate a group against the constraints implied by its edges.
///
/// # Errors
///
/// Returns [`EvaluationError::UnsupportedRelationship`] for groups larger
/// than a pair that contain subset edges, since implications chained
/// across a cluster do not reduce to a single checkable constraint, and
/// [`EvaluationError::MissingMarket`] when a member has no price.
pub fn evaluate(
    group: &OpportunityGroup,
    prices: &PriceBook,
) -> Result<GroupEvaluation, EvaluationError> {
    let composition = group.composition();

    if !group.is_pair() {
        if let Some(reason) = unsupported_reason(&composition) {
            return Err(EvaluationError::UnsupportedRelationship {
                group_id: group.id.to_string(),
                reason,
            });
        }
    }

    let mut pairs = Vec::with_capacity(group.edges.len());
    for edge in &group.edges {
        pairs.push(check_edge(group, edge, prices)?);
    }

    // First edge wins on equal magnitude; edges are in pair order.
    let driver = pairs
        .iter()
        .fold(None::<&PairDeviation>, |best, p| match best {
            Some(b) if b.deviation.abs() >= p.deviation.abs() => Some(b),
            _ => Some(p),
        })
        .ok_or_else(|| EvaluationError::UnsupportedRelationship {
            group_id: group.id.to_string(),
            reason: "group has no retained edges".into(),
        })?;

    let deviation = driver.deviation;
    let aggregate: Decimal = pairs.iter().map(|p| p.deviation.abs()).sum();
    let explanation = explain(group, &composition, driver, aggregate, pairs.len());

    Ok(GroupEvaluation {
        group: group.clone(),
        deviation,
        aggregate,
        pairs,
        explanation,
    })
}

/// Evaluate every group, skipping the ones without a derivable constraint.
pub fn evaluate_all(
    groups: &[OpportunityGroup],
    prices: &PriceBook,
) -> (Vec<GroupEvaluation>, Vec<EvaluationError>) {
    let mut evaluations = Vec::with_capacity(groups.len());
    let mut skipped = Vec::new();

    for group in groups {
        match evaluate(group, prices) {
            Ok(evaluation) => evaluations.push(evaluation),
            Err(error) => {
                warn!(group = %group.id, error = %error, "Skipping group");
                skipped.push(error);
            }
        }
    }

    (evaluations, skipped)
}

fn unsupported_reason(composition: &Composition) -> Option<String> {
    match composition {
        Composition::Uniform(RelationKind::Complement | RelationKind::Equivalent) => None,
        Composition::Uniform(RelationKind::Subset) => {
            Some("chained subset relationships have no joint constraint".into())
        }
        Composition::Uniform(RelationKind::Unrelated) => {
            Some("unrelated markets carry no constraint".into())
        }
        Composition::Mixed(kinds) => {
            if kinds
                .iter()
                .any(|k| matches!(k, RelationKind::Subset | RelationKind::Unrelated))
            {
                let labels: Vec<&str> = kinds.iter().map(|k| k.type_name()).collect();
                Some(format!(
                    "mixed relationship types ({}) have no consistent constraint",
                    labels.join(", ")
                ))
            } else {
                None
            }
        }
    }
}

fn check_edge(
    group: &OpportunityGroup,
    edge: &RelationshipEdge,
    prices: &PriceBook,
) -> Result<PairDeviation, EvaluationError> {
    let price = |id: &MarketId| {
        prices.yes(id).ok_or_else(|| EvaluationError::MissingMarket {
            group_id: group.id.to_string(),
            market_id: id.to_string(),
        })
    };
    let source_price = price(&edge.source)?;
    let target_price = price(&edge.target)?;

    let deviation = match edge.kind {
        RelationKind::Complement => source_price + target_price - Decimal::ONE,
        RelationKind::Equivalent => source_price - target_price,
        RelationKind::Subset => (source_price - target_price).max(Decimal::ZERO),
        RelationKind::Unrelated => {
            return Err(EvaluationError::UnsupportedRelationship {
                group_id: group.id.to_string(),
                reason: "unrelated edge carries no constraint".into(),
            })
        }
    };

    Ok(PairDeviation {
        source: edge.source.clone(),
        target: edge.target.clone(),
        kind: edge.kind,
        source_price,
        target_price,
        deviation,
    })
}

fn explain(
    group: &OpportunityGroup,
    composition: &Composition,
    driver: &PairDeviation,
    aggregate: Decimal,
    edges: usize,
) -> String {
    if edges == 1 {
        return driver.describe();
    }
    let scope = match composition {
        Composition::Uniform(kind) => format!("{} group", kind.type_name().to_lowercase()),
        Composition::Mixed(_) => "mixed group evaluated pairwise".to_string(),
    };
    format!(
        "Largest deviation in {scope} [{}]: {}. Aggregate |deviation| {aggregate} across {edges} edges",
        group.member_list(),
        driver.describe(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{binary_market, edge};
    use rust_decimal_macros::dec;

    fn book(prices: &[(&str, Decimal)]) -> PriceBook {
        let markets: Vec<MarketRecord> = prices
            .iter()
            .map(|(id, p)| binary_market(id, *p))
            .collect();
        PriceBook::from_markets(&markets)
    }

    fn group(edges: Vec<RelationshipEdge>) -> OpportunityGroup {
        OpportunityGroup::from_edges(edges, 8).unwrap()
    }

    #[test]
    fn complement_pair_sums_to_one() {
        let prices = book(&[("a", dec!(0.62)), ("b", dec!(0.46))]);
        let g = group(vec![edge("a", "b", RelationKind::Complement, 0.9)]);

        let evaluation = evaluate(&g, &prices).unwrap();

        assert_eq!(evaluation.deviation, dec!(0.08));
        assert_eq!(evaluation.aggregate, dec!(0.08));
        assert!(evaluation.explanation.contains("complements should sum to 1"));
    }

    #[test]
    fn complement_underpricing_is_negative() {
        let prices = book(&[("a", dec!(0.40)), ("b", dec!(0.50))]);
        let g = group(vec![edge("a", "b", RelationKind::Complement, 0.9)]);
        assert_eq!(evaluate(&g, &prices).unwrap().deviation, dec!(-0.10));
    }

    #[test]
    fn equivalent_pair_is_signed_difference() {
        let prices = book(&[("a", dec!(0.50)), ("b", dec!(0.51))]);
        let g = group(vec![edge("a", "b", RelationKind::Equivalent, 0.8)]);
        assert_eq!(evaluate(&g, &prices).unwrap().deviation, dec!(-0.01));
    }

    #[test]
    fn subset_pair_without_violation_is_zero() {
        let prices = book(&[("a", dec!(0.3)), ("b", dec!(0.5))]);
        let g = group(vec![edge("a", "b", RelationKind::Subset, 0.9)]);
        assert_eq!(evaluate(&g, &prices).unwrap().deviation, Decimal::ZERO);
    }

    #[test]
    fn subset_violation_counts_forbidden_direction() {
        let prices = book(&[("a", dec!(0.6)), ("b", dec!(0.45))]);
        let g = group(vec![edge("a", "b", RelationKind::Subset, 0.9)]);

        let evaluation = evaluate(&g, &prices).unwrap();

        assert_eq!(evaluation.deviation, dec!(0.15));
        assert!(evaluation.explanation.contains("a implies b"));
    }

    #[test]
    fn larger_group_reports_largest_edge_and_aggregate() {
        let prices = book(&[("a", dec!(0.50)), ("b", dec!(0.53)), ("c", dec!(0.49))]);
        let g = group(vec![
            edge("a", "b", RelationKind::Equivalent, 0.9),
            edge("b", "c", RelationKind::Equivalent, 0.9),
        ]);

        let evaluation = evaluate(&g, &prices).unwrap();

        assert_eq!(evaluation.deviation, dec!(0.04));
        assert_eq!(evaluation.aggregate, dec!(0.07));
        assert_eq!(evaluation.driver().unwrap().source.as_str(), "b");
        assert!(evaluation.explanation.contains("equivalent group"));
    }

    #[test]
    fn mixed_complement_equivalent_is_evaluated_pairwise() {
        let prices = book(&[("a", dec!(0.60)), ("b", dec!(0.45)), ("c", dec!(0.58))]);
        let g = group(vec![
            edge("a", "b", RelationKind::Complement, 0.9),
            edge("a", "c", RelationKind::Equivalent, 0.9),
        ]);

        let evaluation = evaluate(&g, &prices).unwrap();

        assert_eq!(evaluation.deviation, dec!(0.05));
        assert_eq!(evaluation.pairs.len(), 2);
        assert!(evaluation.explanation.contains("mixed group evaluated pairwise"));
    }

    #[test]
    fn subset_chain_is_unsupported() {
        let prices = book(&[("a", dec!(0.2)), ("b", dec!(0.4)), ("c", dec!(0.6))]);
        let g = group(vec![
            edge("a", "b", RelationKind::Subset, 0.9),
            edge("b", "c", RelationKind::Subset, 0.9),
        ]);

        assert!(matches!(
            evaluate(&g, &prices),
            Err(EvaluationError::UnsupportedRelationship { .. })
        ));
    }

    #[test]
    fn subset_mixed_with_complement_is_unsupported() {
        let prices = book(&[("a", dec!(0.2)), ("b", dec!(0.4)), ("c", dec!(0.6))]);
        let g = group(vec![
            edge("a", "b", RelationKind::Subset, 0.9),
            edge("b", "c", RelationKind::Complement, 0.9),
        ]);

        assert!(evaluate(&g, &prices).is_err());
    }

    #[test]
    fn missing_price_is_reported() {
        let prices = book(&[("a", dec!(0.2))]);
        let g = group(vec![edge("a", "b", RelationKind::Complement, 0.9)]);

        assert_eq!(
            evaluate(&g, &prices),
            Err(EvaluationError::MissingMarket {
                group_id: "a|b".into(),
                market_id: "b".into(),
            })
        );
    }

    #[test]
    fn evaluate_all_isolates_failures() {
        let prices = book(&[
            ("a", dec!(0.6)),
            ("b", dec!(0.5)),
            ("c", dec!(0.2)),
            ("d", dec!(0.4)),
            ("e", dec!(0.6)),
        ]);
        let groups = vec![
            group(vec![edge("a", "b", RelationKind::Complement, 0.9)]),
            group(vec![
                edge("c", "d", RelationKind::Subset, 0.9),
                edge("d", "e", RelationKind::Subset, 0.9),
            ]),
        ];

        let (evaluations, skipped) = evaluate_all(&groups, &prices);

        assert_eq!(evaluations.len(), 1);
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let prices = book(&[("a", dec!(0.50)), ("b", dec!(0.53)), ("c", dec!(0.47))]);
        let g = group(vec![
            edge("a", "b", RelationKind::Equivalent, 0.9),
            edge("a", "c", RelationKind::Equivalent, 0.9),
        ]);

        let first = evaluate(&g, &prices).unwrap();
        for _ in 0..5 {
            assert_eq!(evaluate(&g, &prices).unwrap(), first);
        }
    }
}
