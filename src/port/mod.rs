//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where the analysis core meets the outside world.
//! Adapters implement them; the application layer only sees the traits.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  normalize → relate →   │
//!     ┌──────────────┤  group → evaluate → rank├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Market  │            │  Relation   │              │    LLM    │
//! │ Source  │            │   Oracle    │              │ Provider  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`MarketSource`] - Supplies raw market listings
//! - [`RelationOracle`] - Judges semantic relationships between markets
//! - [`Llm`] - Text completion backend used by the LLM oracle

pub mod outbound;

pub use outbound::llm::Llm;
pub use outbound::oracle::{MarketSummary, OracleEdge, RelationOracle};
pub use outbound::source::MarketSource;
