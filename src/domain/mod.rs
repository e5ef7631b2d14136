//! Exchange-agnostic domain types.
//!
//! - [`market`] - Raw listings and validated market records
//! - [`relation`] - Relationship kinds and oracle edges
//! - [`group`] - Opportunity groups built from connected edges
//! - [`signal`] - Evaluations and ranked arbitrage signals
//! - [`id`] - Identifier newtypes
//! - [`error`] - Validation and evaluation errors

pub mod error;
pub mod group;
pub mod id;
pub mod market;
pub mod relation;
pub mod signal;

pub use group::{Composition, OpportunityGroup};
pub use id::{GroupId, MarketId};
pub use market::{MarketRecord, Outcome, RawMarket};
pub use relation::{RelationKind, RelationshipEdge};
pub use signal::{ArbitrageSignal, GroupEvaluation, OrderSide, PairDeviation, TradeLeg};
