//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for raw listings, market records and edges.
//! - [`oracle`] - Mock [`RelationOracle`](crate::port::outbound::oracle::RelationOracle)
//!   implementations: `StaticOracle`, `ScriptedOracle`.
//! - [`llm`] - Mock [`Llm`](crate::port::outbound::llm::Llm) returning canned text.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod llm;
pub mod oracle;
