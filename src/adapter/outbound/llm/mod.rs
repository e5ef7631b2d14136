//! LLM provider adapters.
//!
//! Implementations of the [`Llm`](crate::port::outbound::llm::Llm) port:
//!
//! - [`anthropic`] - Anthropic Messages API
//! - [`openai`] - OpenAI Chat Completions and compatible endpoints
//! - [`openrouter`] - OpenRouter, an OpenAI-compatible model router

pub mod anthropic;
pub mod openai;
pub mod openrouter;

pub use anthropic::Anthropic;
pub use openai::OpenAi;
pub use openrouter::OpenRouter;

use crate::error::{ConfigError, Error, Result};

/// Read a provider API key from the environment.
///
/// Keys are never taken from the config file.
pub(crate) fn api_key_from_env(var: &'static str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(Error::Config(ConfigError::MissingField { field: var }))
}
