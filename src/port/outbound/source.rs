//! Market source port.
//!
//! The core treats market acquisition as a single call that returns an
//! already materialized collection. Paging, authentication and rate limits
//! stay behind this trait.

use async_trait::async_trait;

use crate::domain::market::RawMarket;
use crate::error::Result;

/// Supplier of raw market listings for one analysis run.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Return the source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch every listing for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the listings cannot be read at all. Individual
    /// malformed listings are returned as-is and rejected later during
    /// normalization.
    async fn fetch(&self) -> Result<Vec<RawMarket>>;
}
