//! JSON snapshot market source.
//!
//! Accepts either a bare array of listings or an object with a `markets`
//! array, the layout written by fetch scripts alongside metadata such as
//! `timestamp` and `required_tags`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::domain::market::RawMarket;
use crate::error::Result;
use crate::port::outbound::source::MarketSource;

/// Reads raw listings from a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse snapshot text.
    ///
    /// # Errors
    ///
    /// Returns a JSON error when the text is neither layout.
    pub fn parse(text: &str) -> Result<Vec<RawMarket>> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        Ok(snapshot.into_markets())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Bare(Vec<RawMarket>),
    Wrapped { markets: Vec<RawMarket> },
}

impl Snapshot {
    fn into_markets(self) -> Vec<RawMarket> {
        match self {
            Self::Bare(markets) | Self::Wrapped { markets } => markets,
        }
    }
}

#[async_trait]
impl MarketSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch(&self) -> Result<Vec<RawMarket>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let markets = Self::parse(&text)?;
        info!(path = %self.path.display(), count = markets.len(), "Loaded market snapshot");
        Ok(markets)
    }
}
