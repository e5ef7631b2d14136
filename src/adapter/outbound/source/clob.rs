//! CLOB REST market source.
//!
//! Pages through `GET {base_url}/markets?next_cursor=...` until the API
//! returns the end-of-listing cursor, keeping active, open markets that
//! carry every required tag.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::market::RawMarket;
use crate::error::{Error, Result};
use crate::port::outbound::source::MarketSource;

/// Cursor value marking the last page.
pub const END_CURSOR: &str = "LTE=";

/// Default public CLOB endpoint.
pub const DEFAULT_BASE_URL: &str = "https://clob.polymarket.com";

/// Upper bound on pages fetched in one call.
const MAX_PAGES: usize = 1_000;

/// Live listings from a CLOB REST API.
#[derive(Debug, Clone)]
pub struct ClobSource {
    client: Client,
    base_url: Url,
    required_tags: Vec<String>,
    max_markets: Option<usize>,
}

impl ClobSource {
    /// Create a source rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        Ok(Self {
            client: Client::new(),
            base_url,
            required_tags: Vec::new(),
            max_markets: None,
        })
    }

    /// Keep only markets tagged with every one of `tags`.
    #[must_use]
    pub fn with_required_tags(mut self, tags: Vec<String>) -> Self {
        self.required_tags = tags;
        self
    }

    /// Stop after collecting `limit` markets.
    #[must_use]
    pub fn with_max_markets(mut self, limit: Option<usize>) -> Self {
        self.max_markets = limit;
        self
    }

    fn page_url(&self, cursor: &str) -> Result<Url> {
        let mut url = self.base_url.join("markets")?;
        if !cursor.is_empty() {
            url.query_pairs_mut().append_pair("next_cursor", cursor);
        }
        Ok(url)
    }

    fn accepts(&self, market: &ClobMarket) -> bool {
        market.active
            && !market.closed
            && self
                .required_tags
                .iter()
                .all(|tag| market.tags.iter().any(|t| t == tag))
    }
}

#[derive(Debug, Deserialize)]
struct MarketsPage {
    #[serde(default)]
    data: Vec<ClobMarket>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClobMarket {
    condition_id: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "end_date")]
    end_date_iso: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tags: Vec<String>,
    #[serde(default)]
    tokens: Vec<ClobToken>,
    #[serde(default)]
    active: bool,
    #[serde(default = "closed_by_default")]
    closed: bool,
}

#[derive(Debug, Deserialize)]
struct ClobToken {
    outcome: String,
    #[serde(default)]
    price: Option<f64>,
}

const fn closed_by_default() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<ClobMarket> for RawMarket {
    fn from(market: ClobMarket) -> Self {
        let outcomes: Vec<String> = market.tokens.iter().map(|t| t.outcome.clone()).collect();
        // A token without a price is left out so normalization rejects the market.
        let prices: BTreeMap<String, serde_json::Value> = market
            .tokens
            .into_iter()
            .filter_map(|t| t.price.map(|p| (t.outcome, serde_json::Value::from(p))))
            .collect();

        Self {
            id: Some(market.condition_id),
            question: market.question,
            description: market.description,
            outcomes,
            prices,
            end_date: market.end_date_iso,
            category: market.category,
            tags: market.tags,
        }
    }
}

#[async_trait]
impl MarketSource for ClobSource {
    fn name(&self) -> &'static str {
        "clob"
    }

    async fn fetch(&self) -> Result<Vec<RawMarket>> {
        let mut markets = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor = String::new();

        for page in 0..MAX_PAGES {
            let url = self.page_url(&cursor)?;
            debug!(page, url = %url, "Fetching market page");

            let response: MarketsPage = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::Connection(e.to_string()))?
                .json()
                .await?;

            let fetched = response.data.len();
            for market in response.data.into_iter().filter(|m| self.accepts(m)) {
                markets.push(RawMarket::from(market));
                if self.max_markets.is_some_and(|limit| markets.len() >= limit) {
                    info!(count = markets.len(), "Reached market limit");
                    return Ok(markets);
                }
            }
            debug!(page, fetched, kept = markets.len(), "Market page processed");

            match response.next_cursor {
                Some(next) if next != END_CURSOR && !next.is_empty() => {
                    if !seen_cursors.insert(next.clone()) {
                        warn!(cursor = %next, "Cursor repeated, stopping pagination");
                        break;
                    }
                    cursor = next;
                }
                _ => break,
            }
        }

        info!(count = markets.len(), tags = ?self.required_tags, "Fetched live markets");
        Ok(markets)
    }
}
