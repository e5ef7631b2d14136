//! Relationship graph builder.
//!
//! Filters oracle edges, resolves conflicting edges on the same pair, and
//! splits the remaining graph into connected components. Each component with
//! at least two markets becomes an [`OpportunityGroup`].

use std::collections::{BTreeMap, HashSet};

use petgraph::unionfind::UnionFind;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::group::OpportunityGroup;
use crate::domain::id::MarketId;
use crate::domain::market::MarketRecord;
use crate::domain::relation::{RelationKind, RelationshipEdge};

/// Why edges were removed before grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscardCounts {
    /// Edges labelled unrelated.
    pub unrelated: usize,
    /// Edges below the confidence threshold.
    pub low_confidence: usize,
    /// Edges naming a market absent from the run.
    pub unknown_market: usize,
    /// Edges joining a market to itself.
    pub self_loop: usize,
    /// Edges that lost the tie-break on their pair.
    pub superseded: usize,
}

impl DiscardCounts {
    /// Total discarded edges.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.unrelated + self.low_confidence + self.unknown_market + self.self_loop + self.superseded
    }
}

/// Groups built from one edge set.
#[derive(Debug, Clone, Default)]
pub struct GraphOutcome {
    /// Groups ordered by identifier.
    pub groups: Vec<OpportunityGroup>,
    /// Edges kept after filtering and tie-breaks.
    pub retained_edges: usize,
    /// Edges removed before grouping.
    pub discarded: DiscardCounts,
}

impl GraphOutcome {
    /// Number of groups flagged as oversized.
    #[must_use]
    pub fn oversized(&self) -> usize {
        self.groups.iter().filter(|g| g.oversized).count()
    }
}

/// Build opportunity groups from relationship edges.
///
/// Edges that are unrelated, below `min_confidence`, self-referencing or
/// naming unknown markets are discarded. When several edges join the same
/// pair, the one that [`supersedes`](RelationshipEdge::supersedes) the
/// others is kept. Groups above `max_group_size` are flagged, never
/// truncated.
pub fn build_groups(
    markets: &[MarketRecord],
    edges: &[RelationshipEdge],
    min_confidence: f64,
    max_group_size: usize,
) -> GraphOutcome {
    let known: HashSet<&MarketId> = markets.iter().map(MarketRecord::id).collect();
    let mut discarded = DiscardCounts::default();
    let mut by_pair: BTreeMap<(MarketId, MarketId), RelationshipEdge> = BTreeMap::new();

    for edge in edges {
        if edge.kind == RelationKind::Unrelated {
            discarded.unrelated += 1;
            continue;
        }
        if edge.confidence < min_confidence {
            discarded.low_confidence += 1;
            continue;
        }
        if edge.is_self_loop() {
            discarded.self_loop += 1;
            continue;
        }
        if !known.contains(&edge.source) || !known.contains(&edge.target) {
            debug!(source = %edge.source, target = %edge.target, "Edge names unknown market");
            discarded.unknown_market += 1;
            continue;
        }

        match by_pair.entry(edge.pair_key()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(edge.clone());
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                discarded.superseded += 1;
                if edge.supersedes(slot.get()) {
                    debug!(
                        source = %edge.source,
                        target = %edge.target,
                        kept = %edge.kind,
                        dropped = %slot.get().kind,
                        "Conflicting edge replaced"
                    );
                    slot.insert(edge.clone());
                }
            }
        }
    }

    let retained_edges = by_pair.len();
    let groups = components(by_pair.into_values().collect(), max_group_size);

    for group in groups.iter().filter(|g| g.oversized) {
        warn!(
            group = %group.id,
            size = group.len(),
            max_group_size,
            "Oversized opportunity group"
        );
    }

    debug!(
        groups = groups.len(),
        retained_edges,
        discarded = discarded.total(),
        "Relationship graph built"
    );

    GraphOutcome {
        groups,
        retained_edges,
        discarded,
    }
}

/// Split retained edges into connected components.
fn components(edges: Vec<RelationshipEdge>, max_group_size: usize) -> Vec<OpportunityGroup> {
    let mut index: BTreeMap<MarketId, usize> = BTreeMap::new();
    for edge in &edges {
        for id in [&edge.source, &edge.target] {
            let next = index.len();
            index.entry(id.clone()).or_insert(next);
        }
    }

    let mut sets: UnionFind<usize> = UnionFind::new(index.len());
    for edge in &edges {
        sets.union(index[&edge.source], index[&edge.target]);
    }

    let mut by_root: BTreeMap<usize, Vec<RelationshipEdge>> = BTreeMap::new();
    for edge in edges {
        let root = sets.find_mut(index[&edge.source]);
        by_root.entry(root).or_default().push(edge);
    }

    let mut groups: Vec<OpportunityGroup> = by_root
        .into_values()
        .filter_map(|edges| OpportunityGroup::from_edges(edges, max_group_size))
        .collect();
    groups.sort_by(|a, b| a.id.cmp(&b.id));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{binary_market, edge};
    use rust_decimal_macros::dec;

    fn markets(ids: &[&str]) -> Vec<MarketRecord> {
        ids.iter().map(|id| binary_market(id, dec!(0.5))).collect()
    }

    #[test]
    fn connected_edges_form_one_group() {
        let markets = markets(&["a", "b", "c", "d"]);
        let edges = vec![
            edge("a", "b", RelationKind::Equivalent, 0.9),
            edge("b", "c", RelationKind::Equivalent, 0.9),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].id.to_string(), "a|b|c");
        assert_eq!(outcome.retained_edges, 2);
    }

    #[test]
    fn bridging_edge_merges_earlier_components() {
        let markets = markets(&["a", "b", "c", "d", "e", "f"]);
        let edges = vec![
            edge("e", "f", RelationKind::Complement, 0.9),
            edge("a", "b", RelationKind::Equivalent, 0.9),
            edge("c", "d", RelationKind::Equivalent, 0.9),
            edge("b", "c", RelationKind::Equivalent, 0.9),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        let ids: Vec<String> = outcome.groups.iter().map(|g| g.id.to_string()).collect();
        assert_eq!(ids, vec!["a|b|c|d", "e|f"]);
        assert_eq!(outcome.groups[0].edges.len(), 3);
    }

    #[test]
    fn disjoint_components_are_separate_groups() {
        let markets = markets(&["a", "b", "c", "d"]);
        let edges = vec![
            edge("c", "d", RelationKind::Complement, 0.9),
            edge("a", "b", RelationKind::Complement, 0.9),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        let ids: Vec<String> = outcome.groups.iter().map(|g| g.id.to_string()).collect();
        assert_eq!(ids, vec!["a|b", "c|d"]);
    }

    #[test]
    fn filters_unrelated_low_confidence_and_unknown() {
        let markets = markets(&["a", "b", "c"]);
        let edges = vec![
            edge("a", "b", RelationKind::Unrelated, 0.99),
            edge("a", "c", RelationKind::Complement, 0.5),
            edge("b", "ghost", RelationKind::Complement, 0.9),
            edge("c", "c", RelationKind::Complement, 0.9),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        assert!(outcome.groups.is_empty());
        assert_eq!(
            outcome.discarded,
            DiscardCounts {
                unrelated: 1,
                low_confidence: 1,
                unknown_market: 1,
                self_loop: 1,
                superseded: 0,
            }
        );
    }

    #[test]
    fn edge_at_threshold_is_kept() {
        let markets = markets(&["a", "b"]);
        let edges = vec![edge("a", "b", RelationKind::Complement, 0.7)];
        assert_eq!(build_groups(&markets, &edges, 0.7, 8).groups.len(), 1);
    }

    #[test]
    fn conflicting_pair_prefers_higher_confidence() {
        let markets = markets(&["a", "b"]);
        let edges = vec![
            edge("a", "b", RelationKind::Complement, 0.75),
            edge("b", "a", RelationKind::Equivalent, 0.95),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        assert_eq!(outcome.groups[0].edges.len(), 1);
        assert_eq!(outcome.groups[0].edges[0].kind, RelationKind::Equivalent);
        assert_eq!(outcome.discarded.superseded, 1);
    }

    #[test]
    fn exact_tie_prefers_complement() {
        let markets = markets(&["a", "b"]);
        for edges in [
            vec![
                edge("a", "b", RelationKind::Equivalent, 0.7),
                edge("a", "b", RelationKind::Complement, 0.7),
            ],
            vec![
                edge("a", "b", RelationKind::Complement, 0.7),
                edge("a", "b", RelationKind::Equivalent, 0.7),
            ],
            vec![
                edge("a", "b", RelationKind::Subset, 0.7),
                edge("b", "a", RelationKind::Complement, 0.7),
            ],
        ] {
            let outcome = build_groups(&markets, &edges, 0.7, 8);
            assert_eq!(outcome.groups[0].edges[0].kind, RelationKind::Complement);
        }
    }

    #[test]
    fn oversized_groups_are_flagged_not_truncated() {
        let markets = markets(&["a", "b", "c", "d"]);
        let edges = vec![
            edge("a", "b", RelationKind::Equivalent, 0.9),
            edge("b", "c", RelationKind::Equivalent, 0.9),
            edge("c", "d", RelationKind::Equivalent, 0.9),
        ];

        let outcome = build_groups(&markets, &edges, 0.7, 3);

        assert_eq!(outcome.oversized(), 1);
        assert_eq!(outcome.groups[0].len(), 4);
    }

    #[test]
    fn raising_confidence_never_adds_edges() {
        let markets = markets(&["a", "b", "c", "d"]);
        let edges = vec![
            edge("a", "b", RelationKind::Equivalent, 0.72),
            edge("b", "c", RelationKind::Complement, 0.81),
            edge("c", "d", RelationKind::Subset, 0.93),
        ];

        let mut previous = usize::MAX;
        for threshold in [0.0, 0.7, 0.75, 0.85, 0.95, 1.0] {
            let retained = build_groups(&markets, &edges, threshold, 8).retained_edges;
            assert!(retained <= previous);
            previous = retained;
        }
    }

    #[test]
    fn subset_direction_survives_grouping() {
        let markets = markets(&["pa", "swing"]);
        let edges = vec![edge("pa", "swing", RelationKind::Subset, 0.9)];

        let outcome = build_groups(&markets, &edges, 0.7, 8);

        assert_eq!(
            outcome.groups[0].implications,
            vec![(MarketId::new("pa"), MarketId::new("swing"))]
        );
    }
}
