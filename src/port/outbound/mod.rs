//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the external collaborators of the analysis
//! core: where listings come from and who judges market relationships.

pub mod llm;
pub mod oracle;
pub mod source;
