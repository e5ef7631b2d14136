//! Pipeline stages and their orchestration.
//!
//! - [`ingest`] - Normalize raw listings, isolating bad records
//! - [`oracle`] - Batch, dispatch and validate relationship queries
//! - [`graph`] - Build opportunity groups from retained edges
//! - [`constraint`] - Measure each group's no-arbitrage deviation
//! - [`ranker`] - Filter, deduplicate and order signals
//! - [`pipeline`] - Run all stages in sequence

pub mod config;
pub mod constraint;
pub mod graph;
pub mod ingest;
pub mod oracle;
pub mod pipeline;
pub mod ranker;
pub mod report;

pub use config::AnalysisConfig;
pub use pipeline::Pipeline;
pub use report::{AnalysisReport, SkipSummary};
