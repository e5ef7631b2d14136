//! LLM-backed relationship oracle.
//!
//! Markets are listed in the prompt under short references (M1, M2, ...)
//! which the model reproduces far more reliably than venue identifiers.
//! References are mapped back to market ids before tuples leave the
//! adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, OracleError, Result};
use crate::port::outbound::llm::Llm;
use crate::port::outbound::oracle::{MarketSummary, OracleEdge, RelationOracle};

/// Longest description included in the prompt, in characters.
const MAX_DESCRIPTION_CHARS: usize = 400;

/// Relationship oracle that asks an LLM.
pub struct LlmOracle {
    llm: Arc<dyn Llm>,
    batch_limit: usize,
}

impl LlmOracle {
    /// Create an oracle over an LLM client.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            batch_limit: 30,
        }
    }

    /// Override the maximum markets per prompt.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(2);
        self
    }

    fn build_prompt(markets: &[MarketSummary]) -> String {
        let market_list = markets
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut entry = format!("M{}: {}\n   Outcomes: {}", i + 1, m.question, m.outcomes.join(", "));
                if let Some(description) = &m.description {
                    entry.push_str("\n   Resolution: ");
                    entry.push_str(&truncate(description, MAX_DESCRIPTION_CHARS));
                }
                if let Some(end_date) = &m.end_date {
                    entry.push_str("\n   Ends: ");
                    entry.push_str(end_date);
                }
                match (&m.category, m.tags.is_empty()) {
                    (Some(category), true) => {
                        entry.push_str("\n   Category: ");
                        entry.push_str(category);
                    }
                    (Some(category), false) => {
                        entry.push_str(&format!("\n   Category: {category} ({})", m.tags.join(", ")));
                    }
                    (None, false) => {
                        entry.push_str("\n   Tags: ");
                        entry.push_str(&m.tags.join(", "));
                    }
                    (None, true) => {}
                }
                entry
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Analyze these prediction markets for logical relationships between their YES outcomes.

## Markets
{market_list}

## Relationship Types
- **complement**: A=YES exactly when B=NO. Example: "Will X win?" vs "Will X lose?"
- **equivalent**: Same event, different phrasing. Example: "Fed cuts in March" vs "March rate cut"
- **subset**: A=YES implies B=YES (list the implying market as "a"). Example: "Wins PA" implies "Wins a swing state"
- **unrelated**: No logical dependency

## Output (JSON only)
```json
{{
  "relationships": [
    {{
      "a": "M1",
      "b": "M2",
      "type": "complement",
      "confidence": 0.95,
      "reasoning": "Brief explanation"
    }}
  ]
}}
```

Rules:
- Use market references exactly as shown (M1, M2, etc)
- Consider resolution criteria and end dates, not just question wording
- Confidence is a number between 0 and 1
- Omit unrelated pairs; return an empty array if no relationships exist
"#
        )
    }

    /// Parse a completion, mapping short references back to market ids.
    ///
    /// Only the envelope must be well formed. A tuple that does not decode
    /// is logged and skipped so the rest of the batch survives. References
    /// the model invented are passed through unchanged; the caller drops
    /// tuples naming markets outside the batch.
    fn parse_response(response: &str, markets: &[MarketSummary]) -> Result<Vec<OracleEdge>> {
        let json = extract_json(response)?;
        let parsed: LlmResponse = serde_json::from_str(json)
            .map_err(|e| OracleError::Malformed(format!("invalid JSON: {e}")))?;

        let items = parsed.into_items();
        let total = items.len();
        let decoded: Vec<OracleEdge> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<OracleEdge>(item) {
                Ok(edge) => Some(edge),
                Err(e) => {
                    warn!(index, error = %e, "Skipping undecodable relationship tuple");
                    None
                }
            })
            .collect();
        if decoded.len() < total {
            debug!(
                total,
                skipped = total - decoded.len(),
                "Relationship tuples skipped during decoding"
            );
        }

        let refs: HashMap<String, &str> = markets
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("M{}", i + 1), m.id.as_str()))
            .collect();
        let resolve = |reference: &str| {
            let key = reference.trim().to_ascii_uppercase();
            refs.get(&key)
                .map_or_else(|| reference.trim().to_string(), |id| (*id).to_string())
        };

        Ok(decoded
            .into_iter()
            .map(|mut edge| {
                edge.a = resolve(&edge.a);
                edge.b = resolve(&edge.b);
                edge
            })
            .collect())
    }
}

#[async_trait]
impl RelationOracle for LlmOracle {
    fn name(&self) -> &'static str {
        self.llm.name()
    }

    async fn relate(&self, batch: &[MarketSummary]) -> Result<Vec<OracleEdge>> {
        if batch.len() < 2 {
            return Ok(Vec::new());
        }

        let prompt = Self::build_prompt(batch);
        let response = self.llm.complete(&prompt).await?;
        debug!(
            provider = self.llm.name(),
            markets = batch.len(),
            response_len = response.len(),
            "LLM relationship query complete"
        );

        Self::parse_response(&response, batch)
    }

    fn batch_limit(&self) -> usize {
        self.batch_limit
    }
}

/// Response envelope. Tuples stay untyped so one bad entry cannot fail the
/// whole batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum LlmResponse {
    Wrapped {
        #[serde(alias = "relations")]
        relationships: Vec<serde_json::Value>,
    },
    Bare(Vec<serde_json::Value>),
}

impl LlmResponse {
    fn into_items(self) -> Vec<serde_json::Value> {
        match self {
            Self::Wrapped { relationships } | Self::Bare(relationships) => relationships,
        }
    }
}

/// Locate the JSON payload in free text.
///
/// Prefers a fenced code block; otherwise takes the outermost object or
/// array.
fn extract_json(text: &str) -> Result<&str> {
    if let Some(fence) = text.find("```") {
        let body = &text[fence + 3..];
        let body = body.strip_prefix("json").unwrap_or(body);
        let end = body.find("```").unwrap_or(body.len());
        let inner = body[..end].trim();
        if !inner.is_empty() {
            return Ok(inner);
        }
    }

    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(Error::Parse("No JSON found in response".into())),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
