//! Opportunity ranking.
//!
//! Turns group evaluations into [`ArbitrageSignal`]s ordered by materiality.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::application::config::AnalysisConfig;
use crate::domain::id::GroupId;
use crate::domain::signal::{ArbitrageSignal, GroupEvaluation, PairDeviation};

/// Ranked signals plus what the filters removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankOutcome {
    /// Signals, highest materiality first.
    pub signals: Vec<ArbitrageSignal>,
    /// Evaluations whose |deviation| fell below `min_deviation` or was zero.
    pub filtered: usize,
    /// Evaluations dropped because another group had the same members.
    pub deduplicated: usize,
}

/// Rank evaluations by materiality.
///
/// Materiality is `|deviation|`, multiplied by the group's lowest edge
/// confidence when `confidence_weighted` is set, and by
/// `oversized_group_penalty` for oversized groups. Evaluations with zero
/// deviation or `|deviation| < min_deviation` are dropped. Identical member
/// sets keep only the higher-materiality signal. Ties on materiality are
/// ordered by ascending group identifier.
pub fn rank(evaluations: Vec<GroupEvaluation>, config: &AnalysisConfig) -> RankOutcome {
    let mut outcome = RankOutcome::default();
    let mut by_members: BTreeMap<GroupId, ArbitrageSignal> = BTreeMap::new();

    for evaluation in evaluations {
        let magnitude = evaluation.deviation.abs();
        if magnitude.is_zero() || magnitude < config.min_deviation {
            debug!(
                group = %evaluation.group.id,
                deviation = %evaluation.deviation,
                "Below deviation threshold"
            );
            outcome.filtered += 1;
            continue;
        }

        let signal = to_signal(evaluation, config);
        match by_members.get(signal.group_id()) {
            Some(existing) if existing.materiality >= signal.materiality => {
                outcome.deduplicated += 1;
            }
            Some(_) => {
                outcome.deduplicated += 1;
                by_members.insert(signal.group_id().clone(), signal);
            }
            None => {
                by_members.insert(signal.group_id().clone(), signal);
            }
        }
    }

    // BTreeMap iteration is ascending by id, and the sort below is stable.
    let mut signals: Vec<ArbitrageSignal> = by_members.into_values().collect();
    signals.sort_by(|a, b| b.materiality.cmp(&a.materiality));
    outcome.signals = signals;
    outcome
}

/// Materiality of a deviation for a group with the given weakest edge.
#[must_use]
pub fn materiality(
    deviation: Decimal,
    min_confidence: f64,
    oversized: bool,
    config: &AnalysisConfig,
) -> Decimal {
    let mut score = deviation.abs();
    if config.confidence_weighted {
        score *= confidence_weight(min_confidence);
    }
    if oversized {
        score *= config.oversized_group_penalty;
    }
    score
}

fn to_signal(evaluation: GroupEvaluation, config: &AnalysisConfig) -> ArbitrageSignal {
    let min_confidence = evaluation.group.min_confidence();
    let materiality = materiality(
        evaluation.deviation,
        min_confidence,
        evaluation.group.oversized,
        config,
    );
    let trade = evaluation.driver().map(PairDeviation::legs).unwrap_or_default();
    let mut explanation = evaluation.explanation;
    if evaluation.group.oversized {
        explanation.push_str(" (oversized group, materiality penalised)");
    }

    ArbitrageSignal {
        kind: evaluation.group.dominant_kind(),
        deviation: evaluation.deviation,
        aggregate: evaluation.aggregate,
        materiality,
        min_confidence,
        explanation,
        trade,
        group: evaluation.group,
    }
}

/// Exact decimal form of a confidence score.
///
/// Uses the shortest round-trip text of the float so that 0.9 weighs as
/// exactly 0.9.
fn confidence_weight(confidence: f64) -> Decimal {
    let confidence = confidence.clamp(0.0, 1.0);
    Decimal::from_str(&confidence.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(confidence))
        .unwrap_or(Decimal::ONE)
}
