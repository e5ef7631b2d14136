//! Infrastructure bootstrap helpers for runtime wiring.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::llm::{Anthropic, OpenAi, OpenRouter};
use crate::adapter::outbound::oracle::LlmOracle;
use crate::adapter::outbound::source::{ClobSource, SnapshotSource};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::llm::{LlmConfig, LlmProvider};
use crate::infrastructure::config::source::{SourceConfig, SourceKind};
use crate::port::outbound::llm::Llm;
use crate::port::outbound::oracle::RelationOracle;
use crate::port::outbound::source::MarketSource;

/// Build the LLM client for the configured provider.
///
/// # Errors
///
/// Returns a configuration error when the provider's API key is not set.
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn Llm>> {
    let llm: Arc<dyn Llm> = match config.provider {
        LlmProvider::Anthropic => {
            let settings = &config.anthropic;
            Arc::new(Anthropic::from_env(
                settings.model.clone(),
                settings.max_tokens,
                settings.temperature,
            )?)
        }
        LlmProvider::OpenAi => {
            let settings = &config.openai;
            Arc::new(OpenAi::from_env(
                settings.model.clone(),
                settings.max_tokens,
                settings.temperature,
            )?)
        }
        LlmProvider::OpenRouter => {
            let router = &config.openrouter;
            Arc::new(OpenRouter::from_env(
                router.settings.model.clone(),
                router.settings.max_tokens,
                router.settings.temperature,
                &router.base_url,
            )?)
        }
    };
    info!(provider = llm.name(), "LLM client ready");
    Ok(llm)
}

/// Build the relationship oracle on top of an LLM client.
pub fn build_oracle(llm: Arc<dyn Llm>, config: &LlmConfig) -> Arc<dyn RelationOracle> {
    Arc::new(LlmOracle::new(llm).with_batch_limit(config.batch_limit))
}

/// Build the market source.
///
/// `input` overrides the configured snapshot path and forces a file source.
///
/// # Errors
///
/// Returns a configuration error when a file source has no path, or an
/// error when the CLOB URL is invalid.
pub fn build_source(
    config: &SourceConfig,
    input: Option<PathBuf>,
) -> Result<Arc<dyn MarketSource>> {
    if let Some(path) = input {
        return Ok(Arc::new(SnapshotSource::new(path)));
    }

    match config.kind {
        SourceKind::File => {
            let path = config
                .path
                .clone()
                .ok_or(Error::Config(ConfigError::MissingField {
                    field: "source.path",
                }))?;
            Ok(Arc::new(SnapshotSource::new(path)))
        }
        SourceKind::Clob => {
            let source = ClobSource::new(&config.base_url)?
                .with_required_tags(config.required_tags.clone())
                .with_max_markets(config.max_markets);
            Ok(Arc::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::llm::MockLlm;

    #[test]
    fn input_path_overrides_configured_source() {
        let config = SourceConfig {
            kind: SourceKind::Clob,
            ..Default::default()
        };
        let source = build_source(&config, Some(PathBuf::from("markets.json"))).unwrap();
        assert_eq!(source.name(), "snapshot");
    }

    #[test]
    fn file_source_requires_path() {
        let result = build_source(&SourceConfig::default(), None);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField {
                field: "source.path"
            }))
        ));
    }

    #[test]
    fn clob_source_from_config() {
        let config = SourceConfig {
            kind: SourceKind::Clob,
            ..Default::default()
        };
        let source = build_source(&config, None).unwrap();
        assert_eq!(source.name(), "clob");
    }

    #[test]
    fn oracle_uses_configured_batch_limit() {
        let config = LlmConfig {
            batch_limit: 12,
            ..Default::default()
        };
        let oracle = build_oracle(Arc::new(MockLlm::new("[]")), &config);
        assert_eq!(oracle.batch_limit(), 12);
    }
}
