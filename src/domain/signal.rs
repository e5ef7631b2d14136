//! Evaluation results and ranked arbitrage signals.
//!
//! - [`PairDeviation`] - The constraint check for one retained edge
//! - [`TradeLeg`] - One side of the trade that closes a deviation
//! - [`GroupEvaluation`] - A group together with its measured deviation
//! - [`ArbitrageSignal`] - A ranked, explainable candidate opportunity

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::group::OpportunityGroup;
use super::id::{GroupId, MarketId};
use super::relation::RelationKind;

/// Order side on a market's YES outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy YES.
    Buy,
    /// Sell YES.
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// One leg of the trade implied by a deviation, ignoring fees and depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeLeg {
    /// Market to trade.
    pub market: MarketId,
    /// Buy or sell its YES outcome.
    pub side: OrderSide,
    /// Quoted YES probability the leg is taken at.
    pub price: Decimal,
}

impl fmt::Display for TradeLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} YES @ {}", self.side, self.market, self.price)
    }
}

/// Deviation measured on a single retained edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairDeviation {
    /// First market (implying market for subset edges).
    pub source: MarketId,
    /// Second market (implied market for subset edges).
    pub target: MarketId,
    /// Relationship checked.
    pub kind: RelationKind,
    /// YES probability of `source`.
    pub source_price: Decimal,
    /// YES probability of `target`.
    pub target_price: Decimal,
    /// Observed quantity minus the theoretical constraint value.
    pub deviation: Decimal,
}

impl PairDeviation {
    /// Legs that profit if prices move back onto the constraint.
    ///
    /// Overpriced YES is sold and underpriced YES is bought:
    /// complements summing above 1 sell both, below 1 buy both; equivalent
    /// markets sell the dearer side and buy the cheaper; a violated subset
    /// sells the implying market and buys the implied one. Empty when the
    /// constraint holds.
    #[must_use]
    pub fn legs(&self) -> Vec<TradeLeg> {
        use OrderSide::{Buy, Sell};

        let positive = self.deviation > Decimal::ZERO;
        let sides = match self.kind {
            _ if self.deviation.is_zero() => None,
            RelationKind::Complement if positive => Some((Sell, Sell)),
            RelationKind::Complement => Some((Buy, Buy)),
            RelationKind::Equivalent | RelationKind::Subset if positive => Some((Sell, Buy)),
            RelationKind::Equivalent => Some((Buy, Sell)),
            RelationKind::Subset | RelationKind::Unrelated => None,
        };

        sides.map_or_else(Vec::new, |(source_side, target_side)| {
            vec![
                TradeLeg {
                    market: self.source.clone(),
                    side: source_side,
                    price: self.source_price,
                },
                TradeLeg {
                    market: self.target.clone(),
                    side: target_side,
                    price: self.target_price,
                },
            ]
        })
    }

    /// One-line description naming the markets, prices and constraint,
    /// followed by the implied trade when there is one.
    #[must_use]
    pub fn describe(&self) -> String {
        let legs = self.legs();
        if legs.is_empty() {
            return self.describe_constraint();
        }
        let trade: Vec<String> = legs.iter().map(ToString::to_string).collect();
        format!("{}; trade: {}", self.describe_constraint(), trade.join(", "))
    }

    fn describe_constraint(&self) -> String {
        let (a, b, pa, pb) = (
            &self.source,
            &self.target,
            self.source_price,
            self.target_price,
        );
        match self.kind {
            RelationKind::Complement => format!(
                "{a} YES {pa} + {b} YES {pb} = {} (complements should sum to 1, deviation {:+})",
                pa + pb,
                self.deviation
            ),
            RelationKind::Equivalent => format!(
                "{a} YES {pa} vs {b} YES {pb} (equivalent markets should match, deviation {:+})",
                self.deviation
            ),
            RelationKind::Subset => format!(
                "{a} YES {pa} vs {b} YES {pb} ({a} implies {b}, so {a} should not exceed {b}; violation {})",
                self.deviation
            ),
            RelationKind::Unrelated => format!("{a} and {b} are unrelated"),
        }
    }
}

/// A group with its constraint deviation, produced by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEvaluation {
    /// The evaluated group.
    pub group: OpportunityGroup,
    /// Signed deviation of the edge with the largest magnitude.
    pub deviation: Decimal,
    /// Sum of absolute deviations across every retained edge.
    pub aggregate: Decimal,
    /// Per-edge results in edge order.
    pub pairs: Vec<PairDeviation>,
    /// Human-readable account of the deviation.
    pub explanation: String,
}

impl GroupEvaluation {
    /// The edge result that drives the reported deviation.
    #[must_use]
    pub fn driver(&self) -> Option<&PairDeviation> {
        self.pairs
            .iter()
            .find(|p| p.deviation == self.deviation)
            .or_else(|| self.pairs.first())
    }
}

/// A ranked candidate opportunity. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageSignal {
    /// The group that produced the signal.
    pub group: OpportunityGroup,
    /// Dominant relationship type of the group.
    pub kind: RelationKind,
    /// Signed deviation (observed minus theoretical).
    pub deviation: Decimal,
    /// Sum of absolute per-edge deviations.
    pub aggregate: Decimal,
    /// Ranking score: |deviation| weighted by the group's weakest edge.
    pub materiality: Decimal,
    /// Lowest edge confidence in the group.
    pub min_confidence: f64,
    /// Which markets and prices drove the deviation.
    pub explanation: String,
    /// Trade on the driving edge, before transaction costs.
    pub trade: Vec<TradeLeg>,
}

impl ArbitrageSignal {
    /// Group identifier.
    #[must_use]
    pub fn group_id(&self) -> &GroupId {
        &self.group.id
    }

    /// Member markets in lexical order.
    #[must_use]
    pub fn members(&self) -> &[MarketId] {
        &self.group.members
    }
}
