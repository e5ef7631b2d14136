//! Market-related domain types.
//!
//! - [`RawMarket`] - An untrusted listing as supplied by a market source
//! - [`Outcome`] - A single outcome token with its implied probability
//! - [`MarketRecord`] - A validated, immutable market used by the pipeline
//!
//! Probabilities are stored exactly as quoted. They are clamped into
//! `[0, 1]` when a venue reports an out-of-range value, but never
//! renormalized: a binary market quoting 0.52/0.50 keeps its 2% overround.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ValidationError;
use super::id::MarketId;

/// An untrusted market listing as produced by a market source.
///
/// Every field is optional or defaulted so that a partially populated
/// listing still deserializes; [`MarketRecord::normalize`] decides whether
/// it is usable. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMarket {
    /// Venue identifier.
    #[serde(default, alias = "condition_id", alias = "market_id")]
    pub id: Option<String>,
    /// Question text, e.g. "Will X happen by Y?".
    #[serde(default)]
    pub question: Option<String>,
    /// Longer resolution description.
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered outcome token names.
    #[serde(default)]
    pub outcomes: Vec<String>,
    /// Outcome name to quoted price.
    ///
    /// Values may be numbers, numeric strings, or objects carrying a
    /// `probability` field.
    #[serde(default)]
    pub prices: BTreeMap<String, serde_json::Value>,
    /// Resolution date as reported by the venue.
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    /// Venue category.
    #[serde(default)]
    pub category: Option<String>,
    /// Venue tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A single outcome token within a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    name: String,
    probability: Decimal,
}

impl Outcome {
    /// Create a new outcome.
    pub fn new(name: impl Into<String>, probability: Decimal) -> Self {
        Self {
            name: name.into(),
            probability,
        }
    }

    /// Get the outcome name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the implied probability.
    #[must_use]
    pub const fn probability(&self) -> Decimal {
        self.probability
    }
}

/// A validated prediction market.
///
/// Created once from a [`RawMarket`] and never mutated afterwards.
///
/// # Example
///
/// ```
/// use tangle::domain::market::{MarketRecord, Outcome};
/// use tangle::domain::id::MarketId;
/// use rust_decimal_macros::dec;
///
/// let market = MarketRecord::try_new(
///     MarketId::from("rain-tomorrow"),
///     "Will it rain tomorrow?",
///     vec![Outcome::new("Yes", dec!(0.62)), Outcome::new("No", dec!(0.40))],
/// )
/// .unwrap();
///
/// assert!(market.is_binary());
/// assert_eq!(market.yes_probability(), Some(dec!(0.62)));
/// assert_eq!(market.overround(), dec!(0.02));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRecord {
    id: MarketId,
    question: String,
    description: Option<String>,
    outcomes: Vec<Outcome>,
    end_date: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
}

impl MarketRecord {
    /// Create a market with invariant validation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the identifier or question is blank
    /// or fewer than two outcomes are given.
    pub fn try_new(
        id: MarketId,
        question: impl Into<String>,
        outcomes: Vec<Outcome>,
    ) -> Result<Self, ValidationError> {
        if id.as_str().trim().is_empty() {
            return Err(ValidationError::MissingId);
        }
        let question = question.into();
        if question.trim().is_empty() {
            return Err(ValidationError::MissingQuestion {
                market_id: id.to_string(),
            });
        }
        if outcomes.len() < 2 {
            return Err(ValidationError::TooFewOutcomes {
                market_id: id.to_string(),
                count: outcomes.len(),
            });
        }

        Ok(Self {
            id,
            question,
            description: None,
            outcomes,
            end_date: None,
            category: None,
            tags: Vec::new(),
        })
    }

    /// Normalize an untrusted listing into a market record.
    ///
    /// Out-of-range probabilities are clamped into `[0, 1]` with a warning.
    /// When `outcomes` is empty the price keys are used as outcome names.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a missing identifier or question,
    /// fewer than two outcomes, or a missing or non-numeric price.
    pub fn normalize(raw: RawMarket) -> Result<Self, ValidationError> {
        let id = raw
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingId)?;

        let names = if raw.outcomes.is_empty() {
            raw.prices.keys().cloned().collect()
        } else {
            raw.outcomes
        };

        if names.len() < 2 {
            return Err(ValidationError::TooFewOutcomes {
                market_id: id,
                count: names.len(),
            });
        }

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let value = lookup_price(&raw.prices, &name).ok_or_else(|| {
                ValidationError::MissingPrice {
                    market_id: id.clone(),
                    outcome: name.clone(),
                }
            })?;
            let quoted =
                parse_probability(value).ok_or_else(|| ValidationError::NonNumericPrice {
                    market_id: id.clone(),
                    outcome: name.clone(),
                    value: value.to_string(),
                })?;
            let probability = quoted.clamp(Decimal::ZERO, Decimal::ONE);
            if probability != quoted {
                warn!(
                    market = %id,
                    outcome = %name,
                    quoted = %quoted,
                    clamped = %probability,
                    "Probability out of range, clamped"
                );
            }
            outcomes.push(Outcome::new(name, probability));
        }

        let mut record = Self::try_new(
            MarketId::new(id),
            raw.question.unwrap_or_default(),
            outcomes,
        )?;
        record.description = raw.description.filter(|d| !d.trim().is_empty());
        record.end_date = raw.end_date;
        record.category = raw.category;
        record.tags = raw.tags;
        Ok(record)
    }

    /// Get the market ID.
    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    /// Get the market question.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Get the resolution description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get the resolution date, if any.
    #[must_use]
    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    /// Get the venue category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Get the venue tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Get all outcomes in listing order.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Check if this is a binary YES/NO market.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.outcomes.len() == 2
            && self.outcome_by_name("yes").is_some()
            && self.outcome_by_name("no").is_some()
    }

    /// Find an outcome by name (case-insensitive).
    #[must_use]
    pub fn outcome_by_name(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
    }

    /// Implied probability of a named outcome.
    #[must_use]
    pub fn probability(&self, outcome: &str) -> Option<Decimal> {
        self.outcome_by_name(outcome).map(Outcome::probability)
    }

    /// Implied probability of the YES outcome.
    ///
    /// Markets without a "Yes" outcome use their first listed outcome.
    #[must_use]
    pub fn yes_probability(&self) -> Option<Decimal> {
        self.outcome_by_name("yes")
            .or_else(|| self.outcomes.first())
            .map(Outcome::probability)
    }

    /// Sum of all outcome probabilities minus one.
    ///
    /// Positive for a market quoted with a spread, zero when the book is
    /// exactly consistent.
    #[must_use]
    pub fn overround(&self) -> Decimal {
        self.outcomes
            .iter()
            .map(Outcome::probability)
            .sum::<Decimal>()
            - Decimal::ONE
    }

    /// Outcome names in listing order.
    #[must_use]
    pub fn outcome_names(&self) -> Vec<&str> {
        self.outcomes.iter().map(Outcome::name).collect()
    }
}

fn lookup_price<'a>(
    prices: &'a BTreeMap<String, serde_json::Value>,
    outcome: &str,
) -> Option<&'a serde_json::Value> {
    prices.get(outcome).or_else(|| {
        prices
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(outcome))
            .map(|(_, v)| v)
    })
}

fn parse_probability(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s.trim()),
        serde_json::Value::Object(map) => map.get("probability").and_then(parse_probability),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
