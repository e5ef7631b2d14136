//! Outbound adapters (driven side).

pub mod llm;
pub mod oracle;
pub mod report;
pub mod source;
