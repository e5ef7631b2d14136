//! LLM provider configuration.
//!
//! Selects the provider backing the relationship oracle. API keys are read
//! from `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` or `OPENROUTER_API_KEY` at
//! runtime, never from the config file.

use serde::{Deserialize, Serialize};

use crate::adapter::outbound::llm::{anthropic, openai, openrouter};
use crate::error::ConfigError;

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider to use. Defaults to OpenRouter.
    #[serde(default)]
    pub provider: LlmProvider,

    /// Used when `provider = "anthropic"`.
    #[serde(default)]
    pub anthropic: ProviderConfig,

    /// Used when `provider = "openai"`.
    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,

    /// Used when `provider = "openrouter"`.
    #[serde(default = "default_openrouter")]
    pub openrouter: OpenRouterConfig,

    /// Maximum markets per prompt accepted by the oracle.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            anthropic: ProviderConfig::default(),
            openai: default_openai(),
            openrouter: default_openrouter(),
            batch_limit: default_batch_limit(),
        }
    }
}

impl LlmConfig {
    /// Validate the selected provider's settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a blank model, zero
    /// `max_tokens`, a temperature outside `[0, 2]`, or a batch limit
    /// below two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_limit < 2 {
            return Err(ConfigError::InvalidValue {
                field: "llm.batch_limit",
                reason: "must be at least 2".into(),
            });
        }
        let settings = match self.provider {
            LlmProvider::Anthropic => &self.anthropic,
            LlmProvider::OpenAi => &self.openai,
            LlmProvider::OpenRouter => &self.openrouter.settings,
        };
        if settings.model.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "llm.model" });
        }
        if settings.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens",
                reason: "must be greater than 0".into(),
            });
        }
        if !(0.0..=2.0).contains(&settings.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature",
                reason: "must be between 0 and 2".into(),
            });
        }
        Ok(())
    }
}

/// LLM provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Claude models.
    Anthropic,
    /// OpenAI GPT models.
    #[serde(rename = "openai")]
    OpenAi,
    /// Any model routed through OpenRouter.
    #[default]
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl LlmProvider {
    /// Environment variable holding the provider's API key.
    #[must_use]
    pub const fn api_key_var(self) -> &'static str {
        match self {
            Self::Anthropic => anthropic::API_KEY_VAR,
            Self::OpenAi => openai::API_KEY_VAR,
            Self::OpenRouter => openrouter::API_KEY_VAR,
        }
    }
}

/// Model settings shared by every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier.
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Sampling temperature. Low values keep judgements repeatable.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_anthropic_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// OpenRouter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Model and sampling settings.
    #[serde(flatten)]
    pub settings: ProviderConfig,

    /// API root, overridable for self-hosted gateways.
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        default_openrouter()
    }
}

fn default_openai() -> ProviderConfig {
    ProviderConfig {
        model: "gpt-4o".into(),
        ..ProviderConfig::default()
    }
}

fn default_openrouter() -> OpenRouterConfig {
    OpenRouterConfig {
        settings: ProviderConfig {
            model: "anthropic/claude-3.7-sonnet".into(),
            ..ProviderConfig::default()
        },
        base_url: default_openrouter_base_url(),
    }
}

fn default_openrouter_base_url() -> String {
    openrouter::DEFAULT_BASE_URL.into()
}

fn default_anthropic_model() -> String {
    "claude-3-7-sonnet-latest".into()
}

fn default_temperature() -> f64 {
    0.1
}

const fn default_max_tokens() -> usize {
    4096
}

const fn default_batch_limit() -> usize {
    30
}
