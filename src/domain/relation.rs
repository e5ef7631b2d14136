//! Relationship types between prediction markets.
//!
//! - [`RelationKind`] - The logical relationship between two markets
//! - [`RelationshipEdge`] - A typed, confidence-scored link between two markets
//!
//! # Relation Types
//!
//! - **Complement**: the two questions are logical negations; YES prices sum to 1
//! - **Equivalent**: the same event phrased differently; YES prices are equal
//! - **Subset**: YES on the first market implies YES on the second
//! - **Unrelated**: no usable relationship; never reaches graph construction
//!
//! # Examples
//!
//! ```
//! use tangle::domain::relation::{RelationKind, RelationshipEdge};
//! use tangle::domain::id::MarketId;
//!
//! let edge = RelationshipEdge::new(
//!     MarketId::new("trump-wins-pa"),
//!     MarketId::new("trump-wins-swing-state"),
//!     RelationKind::Subset,
//!     0.92,
//! );
//!
//! assert!(edge.is_directed());
//! assert_eq!(edge.pair().0.as_str(), "trump-wins-pa");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::MarketId;

/// The type of logical relationship between two markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Outcomes are logical negations of each other.
    ///
    /// Constraint: P(A) + P(B) = 1
    Complement,
    /// Same event, different phrasing.
    ///
    /// Constraint: P(A) = P(B)
    Equivalent,
    /// YES on the source market implies YES on the target market.
    ///
    /// Constraint: P(A) <= P(B)
    Subset,
    /// No logical relationship.
    Unrelated,
}

impl RelationKind {
    /// Tie-break rank when two equally confident edges disagree on a pair.
    ///
    /// Higher wins: complement gives the strongest, most checkable
    /// constraint, then equivalence, then implication.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Complement => 3,
            Self::Equivalent => 2,
            Self::Subset => 1,
            Self::Unrelated => 0,
        }
    }

    /// Returns the type name as a static string.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Complement => "complement",
            Self::Equivalent => "equivalent",
            Self::Subset => "subset",
            Self::Unrelated => "unrelated",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Error returned when an oracle label names no known relation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRelationKind(pub String);

impl fmt::Display for UnknownRelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relation type '{}'", self.0)
    }
}

impl std::error::Error for UnknownRelationKind {}

impl FromStr for RelationKind {
    type Err = UnknownRelationKind;

    /// Parse an oracle label.
    ///
    /// Accepts any case and a few synonyms: `complementary`/`negation`,
    /// `equivalence`/`same`, `implies`/`nested`, `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "complement" | "complementary" | "negation" => Ok(Self::Complement),
            "equivalent" | "equivalence" | "same" => Ok(Self::Equivalent),
            "subset" | "implies" | "nested" => Ok(Self::Subset),
            "unrelated" | "none" => Ok(Self::Unrelated),
            _ => Err(UnknownRelationKind(s.to_string())),
        }
    }
}

/// A typed, confidence-scored relationship between two markets.
///
/// For [`RelationKind::Subset`] the orientation matters: `source` implies
/// `target`. Every other kind is symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// First market (the implying market for subset edges).
    pub source: MarketId,
    /// Second market (the implied market for subset edges).
    pub target: MarketId,
    /// Relationship type.
    pub kind: RelationKind,
    /// Confidence score (0.0 to 1.0) from the oracle.
    pub confidence: f64,
    /// Human-readable reasoning from the oracle, possibly empty.
    #[serde(default)]
    pub reasoning: String,
}

impl RelationshipEdge {
    /// Creates a new edge without reasoning text.
    pub fn new(source: MarketId, target: MarketId, kind: RelationKind, confidence: f64) -> Self {
        Self {
            source,
            target,
            kind,
            confidence,
            reasoning: String::new(),
        }
    }

    /// Attach oracle reasoning.
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// The two endpoints in stored orientation.
    #[must_use]
    pub fn pair(&self) -> (&MarketId, &MarketId) {
        (&self.source, &self.target)
    }

    /// The two endpoints in lexical order, identifying the unordered pair.
    #[must_use]
    pub fn pair_key(&self) -> (MarketId, MarketId) {
        if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        }
    }

    /// True when orientation carries meaning (subset edges).
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.kind == RelationKind::Subset
    }

    /// True when both endpoints are the same market.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// True when the edge touches the given market.
    #[must_use]
    pub fn involves(&self, market: &MarketId) -> bool {
        &self.source == market || &self.target == market
    }

    /// Whether this edge should replace `other` on the same pair.
    ///
    /// Higher confidence wins; on an exact tie the kind with higher
    /// [`precedence`](RelationKind::precedence) wins. Equal edges keep
    /// the incumbent.
    #[must_use]
    pub fn supersedes(&self, other: &Self) -> bool {
        match self.confidence.partial_cmp(&other.confidence) {
            Some(std::cmp::Ordering::Greater) => true,
            Some(std::cmp::Ordering::Equal) => self.kind.precedence() > other.kind.precedence(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(s: &str) -> MarketId {
        MarketId::new(s)
    }

    #[test]
    fn precedence_orders_complement_first() {
        assert!(RelationKind::Complement.precedence() > RelationKind::Equivalent.precedence());
        assert!(RelationKind::Equivalent.precedence() > RelationKind::Subset.precedence());
        assert!(RelationKind::Subset.precedence() > RelationKind::Unrelated.precedence());
    }

    #[test]
    fn parse_labels_and_synonyms() {
        assert_eq!("COMPLEMENT".parse::<RelationKind>(), Ok(RelationKind::Complement));
        assert_eq!("complementary".parse::<RelationKind>(), Ok(RelationKind::Complement));
        assert_eq!(" Equivalent ".parse::<RelationKind>(), Ok(RelationKind::Equivalent));
        assert_eq!("implies".parse::<RelationKind>(), Ok(RelationKind::Subset));
        assert_eq!("unrelated".parse::<RelationKind>(), Ok(RelationKind::Unrelated));
        assert!("mutually_exclusive".parse::<RelationKind>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_labels() {
        let json = serde_json::to_string(&RelationKind::Complement).unwrap();
        assert_eq!(json, "\"COMPLEMENT\"");
    }

    #[test]
    fn pair_key_is_orientation_free() {
        let ab = RelationshipEdge::new(market("a"), market("b"), RelationKind::Equivalent, 0.9);
        let ba = RelationshipEdge::new(market("b"), market("a"), RelationKind::Equivalent, 0.9);
        assert_eq!(ab.pair_key(), ba.pair_key());
    }

    #[test]
    fn higher_confidence_supersedes() {
        let weak = RelationshipEdge::new(market("a"), market("b"), RelationKind::Complement, 0.6);
        let strong = RelationshipEdge::new(market("a"), market("b"), RelationKind::Subset, 0.8);
        assert!(strong.supersedes(&weak));
        assert!(!weak.supersedes(&strong));
    }

    #[test]
    fn equal_confidence_prefers_complement() {
        let complement =
            RelationshipEdge::new(market("a"), market("b"), RelationKind::Complement, 0.7);
        let equivalent =
            RelationshipEdge::new(market("a"), market("b"), RelationKind::Equivalent, 0.7);
        assert!(complement.supersedes(&equivalent));
        assert!(!equivalent.supersedes(&complement));
    }

    #[test]
    fn identical_edges_keep_incumbent() {
        let edge = RelationshipEdge::new(market("a"), market("b"), RelationKind::Subset, 0.7);
        assert!(!edge.clone().supersedes(&edge));
    }

    #[test]
    fn self_loop_and_involves() {
        let edge = RelationshipEdge::new(market("a"), market("a"), RelationKind::Equivalent, 0.9);
        assert!(edge.is_self_loop());
        assert!(edge.involves(&market("a")));
        assert!(!edge.involves(&market("b")));
    }
}
