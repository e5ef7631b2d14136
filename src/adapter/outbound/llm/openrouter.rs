//! OpenRouter LLM client.
//!
//! OpenRouter exposes many vendors' models behind an OpenAI-compatible API.
//! Requests carry the referer and title headers OpenRouter uses to
//! attribute traffic.

use async_trait::async_trait;

use super::api_key_from_env;
use super::openai::OpenAi;
use crate::error::Result;
use crate::port::outbound::llm::Llm;

/// OpenRouter API base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

const REFERER: &str = "http://localhost";
const TITLE: &str = "tangle";

/// OpenRouter client.
#[derive(Debug)]
pub struct OpenRouter {
    inner: OpenAi,
}

impl OpenRouter {
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f64,
        base_url: &str,
    ) -> Result<Self> {
        let inner = OpenAi::with_base_url(api_key, model, max_tokens, temperature, base_url)?
            .with_header("HTTP-Referer", REFERER)
            .with_header("X-Title", TITLE);
        Ok(Self { inner })
    }

    /// Create a client with the key from `OPENROUTER_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the variable is unset or blank, or
    /// an error if `base_url` is invalid.
    pub fn from_env(
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f64,
        base_url: &str,
    ) -> Result<Self> {
        let api_key = api_key_from_env(API_KEY_VAR)?;
        Self::new(api_key, model, max_tokens, temperature, base_url)
    }

    /// Model identifier, e.g. `anthropic/claude-3.7-sonnet`.
    #[must_use]
    pub fn model(&self) -> &str {
        self.inner.model()
    }
}

#[async_trait]
impl Llm for OpenRouter {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.inner.complete(prompt).await
    }
}
