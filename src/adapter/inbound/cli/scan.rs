//! Handler for the `scan` command.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::ScanArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::report::ReportWriter;
use crate::application::{AnalysisReport, Pipeline};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "config.toml";

/// Warnings printed before the rest are summarized.
const WARNING_PREVIEW: usize = 5;

/// Execute the scan command.
pub async fn execute(args: &ScanArgs) -> Result<()> {
    let mut config = load_config(args)?;
    args.apply_overrides(&mut config.analysis);
    config.validate()?;

    if output::verbosity() > 1 {
        config.logging.level = "debug".into();
    }
    config.init_logging();

    let source = bootstrap::build_source(&config.source, args.input.clone())?;
    let llm = bootstrap::build_llm(&config.llm)?;
    let oracle = bootstrap::build_oracle(llm, &config.llm);

    output::header(env!("CARGO_PKG_VERSION"));
    output::action("Fetching", source.name());
    let raw = source.fetch().await?;
    info!(source = source.name(), markets = raw.len(), "Markets fetched");

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());

    output::action("Analyzing", &format!("{} markets", raw.len()));
    let pipeline = Pipeline::new(oracle, config.analysis.clone());
    let report = pipeline.run(raw, &cancel).await;
    watcher.abort();
    let report = report?;

    let saved = if args.no_report {
        None
    } else {
        Some(ReportWriter::new(args.output_dir.clone()).write(&report).await?)
    };

    print_report(&report, saved.as_deref(), args.top);
    Ok(())
}

fn load_config(args: &ScanArgs) -> Result<Config> {
    if let Some(path) = &args.config {
        return Config::load(path);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        return Config::load(DEFAULT_CONFIG);
    }
    Ok(Config::default())
}

/// Cancel `token` on Ctrl-C so in-flight oracle batches are abandoned.
fn spawn_interrupt_watcher(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing with completed batches");
            token.cancel();
        }
    })
}

fn print_report(report: &AnalysisReport, saved: Option<&Path>, top: usize) {
    output::section("Summary");
    output::field("Run", report.run_id);
    output::field("Oracle", &report.oracle);
    output::field(
        "Markets",
        format!("{} valid of {}", report.valid_markets, report.total_markets),
    );
    output::field("Oracle batches", report.batches);
    output::field("Edges", report.retained_edges);
    output::field("Groups", report.groups);
    output::field("Signals", output::highlight(report.signals.len()));

    let skipped = &report.skipped;
    if !skipped.is_clean() || output::verbosity() > 0 {
        output::section("Skipped");
        output::field("Invalid records", skipped.invalid_records);
        output::field("Failed batches", skipped.failed_batches);
        output::field("Cancelled", skipped.cancelled_batches);
        output::field("Dropped edges", skipped.dropped_oracle_edges);
        output::field("Discarded edges", skipped.discarded_edges);
        output::field("Unsupported", skipped.unsupported_groups);
        output::field("Oversized", skipped.oversized_groups);
        output::field("Below threshold", skipped.filtered_signals);
    }

    if report.was_cancelled() {
        output::warning("Run was interrupted; results cover completed batches only");
    }

    let preview = if output::verbosity() > 0 {
        report.warnings.len()
    } else {
        WARNING_PREVIEW
    };
    for warning in report.warnings.iter().take(preview) {
        output::warning(warning);
    }
    if report.warnings.len() > preview {
        output::note(&format!(
            "{} more warnings in the report (use -v to show all)",
            report.warnings.len() - preview
        ));
    }

    if report.signals.is_empty() {
        output::success("No inconsistencies above threshold");
    } else {
        output::section("Signals");
        output::signals(&report.signals, top);
        if report.signals.len() > top {
            output::note(&format!(
                "{} more signals in the report",
                report.signals.len() - top
            ));
        }
    }

    if let Some(path) = saved {
        output::success(&format!("Report written to {}", path.display()));
    }
}
