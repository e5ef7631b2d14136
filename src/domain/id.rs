//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Market identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new `MarketId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the market ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MarketId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier for an opportunity group.
///
/// Holds the sorted, deduplicated member set, so the same markets always
/// map to the same identifier across runs. Equality and ordering compare
/// members one by one, which keeps distinct sets distinct even when an id
/// contains the display separator. Ordering is the ranking tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Vec<MarketId>);

impl GroupId {
    /// Separator between member identifiers in the display form.
    pub const SEPARATOR: char = '|';

    /// Build the identifier for a member set.
    ///
    /// Members are sorted and deduplicated, so argument order does not
    /// matter.
    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a MarketId>) -> Self {
        let mut ids: Vec<MarketId> = members.into_iter().cloned().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// Members in lexical order.
    #[must_use]
    pub fn members(&self) -> &[MarketId] {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Self::SEPARATOR)?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}
