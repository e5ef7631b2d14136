//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - Driving side: the command-line interface
//! - [`outbound`] - Driven side: LLM providers, oracles, market sources, report files

pub mod inbound;
pub mod outbound;
