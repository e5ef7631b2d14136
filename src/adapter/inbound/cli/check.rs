//! Handler for the `check-config` command.

use crate::adapter::inbound::cli::command::CheckConfigArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::llm::LlmProvider;
use crate::infrastructure::config::source::SourceKind;
use crate::infrastructure::config::Config;

/// Validate a configuration file without contacting any service.
pub fn execute(args: &CheckConfigArgs) -> Result<()> {
    let config = Config::load(&args.config)?;

    output::section("Configuration Check");
    output::field("Config", args.config.display());
    output::success("Configuration file is valid");

    output::section("Oracle");
    let (provider, model) = match config.llm.provider {
        LlmProvider::Anthropic => ("anthropic", &config.llm.anthropic.model),
        LlmProvider::OpenAi => ("openai", &config.llm.openai.model),
        LlmProvider::OpenRouter => ("openrouter", &config.llm.openrouter.settings.model),
    };
    output::field("Provider", provider);
    output::field("Model", model);
    let key_var = config.llm.provider.api_key_var();
    if std::env::var(key_var).is_ok_and(|key| !key.trim().is_empty()) {
        output::success("API key detected");
    } else {
        output::warning(&format!("{key_var} is not set (required for scan)"));
    }

    output::section("Source");
    match config.source.kind {
        SourceKind::File => {
            output::field("Kind", "file");
            match &config.source.path {
                Some(path) => output::field("Path", path.display()),
                None => output::field("Path", "none (pass --input)"),
            }
        }
        SourceKind::Clob => {
            output::field("Kind", "clob");
            output::field("URL", &config.source.base_url);
            if !config.source.required_tags.is_empty() {
                output::field("Tags", config.source.required_tags.join(", "));
            }
        }
    }

    let analysis = &config.analysis;
    output::section("Analysis");
    output::field("Min confidence", analysis.min_edge_confidence);
    output::field("Min deviation", analysis.min_deviation);
    output::field("Batch size", analysis.oracle_batch_size);
    output::field("In flight", analysis.max_in_flight_batches);
    output::field("Max group size", analysis.max_group_size);
    output::field("Retries", analysis.max_retries);

    output::success("Configuration check complete");
    Ok(())
}
