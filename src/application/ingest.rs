//! Batch normalization of raw listings.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::domain::error::ValidationError;
use crate::domain::market::{MarketRecord, RawMarket};

/// A raw listing excluded from the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRejection {
    /// Position of the listing in the input.
    pub index: usize,
    /// Identifier as supplied, if any.
    pub market_id: Option<String>,
    /// Why the listing was excluded.
    #[serde(serialize_with = "serialize_display")]
    pub error: ValidationError,
}

fn serialize_display<S: serde::Serializer>(
    error: &ValidationError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Normalize every listing, isolating failures per record.
///
/// Records keep their input order. A repeated identifier rejects the later
/// occurrence so that each market id is unique downstream.
pub fn normalize_all(raws: Vec<RawMarket>) -> (Vec<MarketRecord>, Vec<RecordRejection>) {
    let mut markets = Vec::with_capacity(raws.len());
    let mut rejections = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in raws.into_iter().enumerate() {
        let market_id = raw.id.clone();
        let result = MarketRecord::normalize(raw).and_then(|record| {
            if seen.insert(record.id().clone()) {
                Ok(record)
            } else {
                Err(ValidationError::DuplicateId {
                    market_id: record.id().to_string(),
                })
            }
        });

        match result {
            Ok(record) => markets.push(record),
            Err(error) => {
                warn!(index, market = ?market_id, error = %error, "Invalid market record excluded");
                rejections.push(RecordRejection {
                    index,
                    market_id,
                    error,
                });
            }
        }
    }

    (markets, rejections)
}
