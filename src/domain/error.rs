//! Domain validation and evaluation errors.
//!
//! Both kinds are isolated failures: a [`ValidationError`] excludes a single
//! market record and an [`EvaluationError`] skips a single opportunity group.
//! Neither aborts an analysis run.
//!
//! # Examples
//!
//! ```
//! use tangle::domain::error::ValidationError;
//! use tangle::domain::market::{MarketRecord, RawMarket};
//!
//! let raw = RawMarket {
//!     id: Some("  ".into()),
//!     question: Some("Will it rain?".into()),
//!     ..Default::default()
//! };
//!
//! assert!(matches!(
//!     MarketRecord::normalize(raw),
//!     Err(ValidationError::MissingId)
//! ));
//! ```

use thiserror::Error;

/// A raw market record failed normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier absent or blank.
    #[error("market identifier is missing or empty")]
    MissingId,

    /// Question text absent or blank.
    #[error("market {market_id} has no question text")]
    MissingQuestion {
        /// The offending market.
        market_id: String,
    },

    /// Fewer than two outcome tokens.
    #[error("market {market_id} has {count} outcomes, need at least 2")]
    TooFewOutcomes {
        /// The offending market.
        market_id: String,
        /// Number of outcomes found.
        count: usize,
    },

    /// An outcome token has no price entry.
    #[error("market {market_id} has no price for outcome {outcome}")]
    MissingPrice {
        /// The offending market.
        market_id: String,
        /// Outcome without a price.
        outcome: String,
    },

    /// A price entry is not a number.
    #[error("market {market_id} has non-numeric price {value} for outcome {outcome}")]
    NonNumericPrice {
        /// The offending market.
        market_id: String,
        /// Outcome with the bad price.
        outcome: String,
        /// Textual form of the rejected value.
        value: String,
    },

    /// The identifier was already seen earlier in the same input.
    #[error("duplicate market identifier {market_id}")]
    DuplicateId {
        /// The repeated identifier.
        market_id: String,
    },
}

/// An opportunity group could not be turned into a single checkable constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The group's relationship types admit no consistent joint constraint.
    #[error("group {group_id} has no derivable constraint: {reason}")]
    UnsupportedRelationship {
        /// The skipped group.
        group_id: String,
        /// Why no constraint applies.
        reason: String,
    },

    /// A member's YES probability could not be resolved.
    #[error("group {group_id} references market {market_id} without a price")]
    MissingMarket {
        /// The skipped group.
        group_id: String,
        /// The market lacking data.
        market_id: String,
    },
}
