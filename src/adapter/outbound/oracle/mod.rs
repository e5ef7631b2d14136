//! Relationship oracle adapters.
//!
//! - [`llm`] - Oracle backed by any [`Llm`](crate::port::outbound::llm::Llm)

pub mod llm;

pub use llm::LlmOracle;
