//! Market source adapters.
//!
//! - [`snapshot`] - Listings saved to a JSON file
//! - [`clob`] - Live listings paged from a CLOB REST API

pub mod clob;
pub mod snapshot;

pub use clob::ClobSource;
pub use snapshot::SnapshotSource;
