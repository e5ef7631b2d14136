//! Market source configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapter::outbound::source::clob;
use crate::error::ConfigError;

/// Where raw listings come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind. Defaults to a snapshot file.
    #[serde(default)]
    pub kind: SourceKind,

    /// Snapshot file for `kind = "file"`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// API root for `kind = "clob"`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tags every live market must carry.
    #[serde(default)]
    pub required_tags: Vec<String>,

    /// Stop after this many live markets.
    #[serde(default)]
    pub max_markets: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: None,
            base_url: default_base_url(),
            required_tags: Vec::new(),
            max_markets: None,
        }
    }
}

impl SourceConfig {
    /// Validate source settings.
    ///
    /// A missing snapshot path is not an error here: it may still be
    /// supplied on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero market limit or a
    /// blank CLOB URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_markets == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "source.max_markets",
                reason: "must be greater than 0".into(),
            });
        }
        if self.kind == SourceKind::Clob && self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "source.base_url",
            });
        }
        Ok(())
    }
}

/// Supported market sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON snapshot on disk.
    #[default]
    File,
    /// Live CLOB REST listing.
    Clob,
}

fn default_base_url() -> String {
    clob::DEFAULT_BASE_URL.into()
}
