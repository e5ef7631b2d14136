//! Opportunity groups: clusters of markets that jointly constrain each other.
//!
//! A [`OpportunityGroup`] is built from the retained edges of one connected
//! component of the relationship graph. Because membership is derived from
//! the edges themselves, every member is guaranteed to touch at least one
//! retained edge, and groups with fewer than two members cannot be built.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::id::{GroupId, MarketId};
use super::relation::{RelationKind, RelationshipEdge};

/// How the edges inside a group are typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// Every edge carries the same kind.
    Uniform(RelationKind),
    /// Edges carry different kinds (listed in descending precedence).
    Mixed(Vec<RelationKind>),
}

/// A connected cluster of markets with the edges that justify membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityGroup {
    /// Identifier derived from the sorted member set.
    pub id: GroupId,
    /// Members in lexical order.
    pub members: Vec<MarketId>,
    /// Retained edges, ordered by endpoint pair.
    pub edges: Vec<RelationshipEdge>,
    /// Directed `(implying, implied)` pairs from subset edges.
    pub implications: Vec<(MarketId, MarketId)>,
    /// Set when membership exceeds the configured soft size limit.
    pub oversized: bool,
}

impl OpportunityGroup {
    /// Build a group from its retained edges.
    ///
    /// Self-loops are ignored. Returns `None` when fewer than two distinct
    /// markets remain, since a singleton group carries no constraint.
    #[must_use]
    pub fn from_edges(edges: Vec<RelationshipEdge>, max_size: usize) -> Option<Self> {
        let mut edges: Vec<RelationshipEdge> =
            edges.into_iter().filter(|e| !e.is_self_loop()).collect();
        edges.sort_by(|a, b| a.pair_key().cmp(&b.pair_key()));

        let members: Vec<MarketId> = edges
            .iter()
            .flat_map(|e| [e.source.clone(), e.target.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if members.len() < 2 {
            return None;
        }

        let implications = edges
            .iter()
            .filter(|e| e.is_directed())
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        Some(Self {
            id: GroupId::from_members(&members),
            oversized: members.len() > max_size,
            members,
            edges,
            implications,
        })
    }

    /// Number of member markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Groups always hold at least two members; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True for a two-market group joined by a single edge.
    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.members.len() == 2 && self.edges.len() == 1
    }

    /// Check if the group contains a market.
    #[must_use]
    pub fn contains(&self, market: &MarketId) -> bool {
        self.members.binary_search(market).is_ok()
    }

    /// Lowest edge confidence in the group.
    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        self.edges
            .iter()
            .map(|e| e.confidence)
            .fold(f64::INFINITY, f64::min)
            .min(1.0)
    }

    /// Edge-type composition of the group.
    #[must_use]
    pub fn composition(&self) -> Composition {
        let kinds: BTreeSet<(std::cmp::Reverse<u8>, KindKey)> = self
            .edges
            .iter()
            .map(|e| (std::cmp::Reverse(e.kind.precedence()), KindKey(e.kind)))
            .collect();
        let mut kinds: Vec<RelationKind> = kinds.into_iter().map(|(_, k)| k.0).collect();
        if kinds.len() == 1 {
            Composition::Uniform(kinds.remove(0))
        } else {
            Composition::Mixed(kinds)
        }
    }

    /// The group's dominant relationship type.
    ///
    /// The most frequent edge kind; ties go to the kind with higher
    /// precedence.
    #[must_use]
    pub fn dominant_kind(&self) -> RelationKind {
        let mut counts: BTreeMap<KindKey, usize> = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(KindKey(edge.kind)).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by(|(ka, ca), (kb, cb)| {
                ca.cmp(cb)
                    .then_with(|| ka.0.precedence().cmp(&kb.0.precedence()))
            })
            .map_or(RelationKind::Unrelated, |(k, _)| k.0)
    }

    /// Members in lexical order joined for display.
    #[must_use]
    pub fn member_list(&self) -> String {
        self.members
            .iter()
            .map(MarketId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Orders kinds by precedence so they can key ordered collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KindKey(RelationKind);

impl Ord for KindKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.precedence().cmp(&other.0.precedence())
    }
}

impl PartialOrd for KindKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
