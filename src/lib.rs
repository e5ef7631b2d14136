//! Tangle - cross-market arbitrage detection for prediction markets.
//!
//! Finds sets of markets whose questions are logically linked (one outcome
//! implies another, two markets are complements, two phrasings describe the
//! same event) and whose current prices violate that link.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Markets, relationships, groups and signals
//! - [`port`] - Traits for market sources, relationship oracles and LLMs
//! - [`application`] - The analysis pipeline and its stages
//! - [`adapter`] - CLI, LLM providers, market sources, report files
//! - [`infrastructure`] - Configuration and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tangle::adapter::outbound::llm::OpenRouter;
//! use tangle::adapter::outbound::oracle::LlmOracle;
//! use tangle::adapter::outbound::source::SnapshotSource;
//! use tangle::application::{AnalysisConfig, Pipeline};
//! use tangle::port::MarketSource;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> tangle::error::Result<()> {
//! let llm = OpenRouter::from_env("anthropic/claude-3.7-sonnet", 4096, 0.1, "https://openrouter.ai/api/v1")?;
//! let oracle = Arc::new(LlmOracle::new(Arc::new(llm)));
//! let markets = SnapshotSource::new("markets.json").fetch().await?;
//!
//! let pipeline = Pipeline::new(oracle, AnalysisConfig::default());
//! let report = pipeline.run(markets, &CancellationToken::new()).await?;
//! println!("{} signals", report.signals.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
