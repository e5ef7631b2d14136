//! Terminal output for scan results.
//!
//! Every printed event has a human rendering and a JSON rendering. With
//! `--json` each event is one line `{"type": ..., "payload": ...}`, which
//! keeps stdout parseable. `--quiet` hides everything except warnings and
//! errors.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::domain::signal::ArbitrageSignal;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
    /// Apply ANSI colors to human-readable output.
    pub color: bool,
}

impl OutputConfig {
    /// Create a new output configuration.
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8, color: bool) -> Self {
        Self {
            json,
            quiet,
            verbose,
            color,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Check if regular (non-JSON) output should be suppressed.
fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

/// Where a line goes and whether quiet mode hides it.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Channel {
    /// Stdout, hidden by `--quiet`.
    Regular,
    /// Stdout, always shown.
    Notice,
    /// Stderr, always shown.
    Failure,
}

/// Emit one event: a JSON line in JSON mode, otherwise the human rendering.
fn emit(
    channel: Channel,
    kind: &str,
    payload: serde_json::Value,
    human: impl FnOnce(OutputConfig) -> String,
) {
    let config = read_config();
    if config.json {
        let line = json!({ "type": kind, "payload": payload });
        if channel == Channel::Failure {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
        return;
    }
    match channel {
        Channel::Regular if regular_output_suppressed(config) => {}
        Channel::Failure => eprintln!("{}", human(config)),
        Channel::Regular | Channel::Notice => println!("{}", human(config)),
    }
}

/// Apply `paint` only when colors are enabled.
fn styled(config: OutputConfig, text: &str, paint: impl Fn(&str) -> String) -> String {
    if config.color {
        paint(text)
    } else {
        text.to_string()
    }
}

/// Apply output settings from global CLI flags.
///
/// Call this early in the CLI entry point.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

/// Verbosity level from `-v` flags.
#[must_use]
pub fn verbosity() -> u8 {
    read_config().verbose
}

/// Print the tool name and version, followed by a blank line.
pub fn header(version: &str) {
    emit(
        Channel::Regular,
        "header",
        json!({ "app": "tangle", "version": version }),
        |config| {
            format!(
                "{} {}\n",
                styled(config, "tangle", |t| t.bold().to_string()),
                styled(config, version, |t| t.dimmed().to_string())
            )
        },
    );
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        Channel::Regular,
        "field",
        json!({ "label": label, "value": value }),
        |config| {
            let label = format!("{label:<16}");
            format!("  {} {value}", styled(config, &label, |t| t.dimmed().to_string()))
        },
    );
}

/// Print a success line.
pub fn success(message: &str) {
    emit(Channel::Regular, "success", json!({ "message": message }), |config| {
        format!("  {} {message}", styled(config, "✓", |t| t.green().to_string()))
    });
}

/// Print a warning line. Shown even in quiet mode.
pub fn warning(message: &str) {
    emit(Channel::Notice, "warning", json!({ "message": message }), |config| {
        format!("  {} {message}", styled(config, "⚠", |t| t.yellow().to_string()))
    });
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    emit(Channel::Failure, "error", json!({ "message": message }), |config| {
        format!("  {} {message}", styled(config, "×", |t| t.red().to_string()))
    });
}

/// Print a section title after a blank line.
pub fn section(title: &str) {
    emit(Channel::Regular, "section", json!({ "title": title }), |config| {
        format!("\n{}", styled(config, title, |t| t.bold().to_string()))
    });
}

/// Print a dimmed aside.
pub fn note(message: &str) {
    emit(Channel::Regular, "note", json!({ "message": message }), |config| {
        format!("  {}", styled(config, message, |t| t.dimmed().to_string()))
    });
}

/// Announce a stage that is starting, e.g. "Fetching clob...".
pub fn action(verb: &str, target: &str) {
    emit(
        Channel::Regular,
        "action",
        json!({ "verb": verb, "target": target, "status": "in_progress" }),
        |config| {
            format!(
                "  {} {target}...",
                styled(config, verb, |t| t.bold().cyan().to_string())
            )
        },
    );
}

/// Format a value in cyan for use inside another line.
pub fn highlight(value: impl Display) -> String {
    let config = read_config();
    let value = value.to_string();
    if config.json {
        return value;
    }
    styled(config, &value, |t| t.cyan().to_string())
}

#[derive(Tabled)]
struct SignalRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Markets")]
    markets: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
    #[tabled(rename = "Materiality")]
    materiality: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Trade")]
    trade: String,
}

impl SignalRow {
    fn new(rank: usize, signal: &ArbitrageSignal) -> Self {
        Self {
            rank,
            kind: signal.kind.to_string(),
            markets: signal.group.member_list(),
            deviation: signal.deviation.round_dp(4).to_string(),
            materiality: signal.materiality.round_dp(4).to_string(),
            confidence: format!("{:.2}", signal.min_confidence),
            trade: trade_summary(signal),
        }
    }
}

/// Compact trade column, e.g. "SELL a, BUY b".
fn trade_summary(signal: &ArbitrageSignal) -> String {
    signal
        .trade
        .iter()
        .map(|leg| format!("{} {}", leg.side, leg.market))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rounded table of signals, ranked from 1.
fn signal_table(signals: &[ArbitrageSignal]) -> String {
    let rows: Vec<SignalRow> = signals
        .iter()
        .enumerate()
        .map(|(index, signal)| SignalRow::new(index + 1, signal))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Print ranked signals, at most `limit` of them.
///
/// JSON mode emits one `signal` line per entry with the full signal. With
/// `-v` each table row is followed by its explanation.
pub fn signals(signals: &[ArbitrageSignal], limit: usize) {
    let config = read_config();
    let shown = &signals[..signals.len().min(limit)];

    if config.json {
        for (index, signal) in shown.iter().enumerate() {
            emit(
                Channel::Regular,
                "signal",
                json!({ "rank": index + 1, "signal": signal }),
                |_| String::new(),
            );
        }
        return;
    }
    if regular_output_suppressed(config) || shown.is_empty() {
        return;
    }

    for line in signal_table(shown).lines() {
        println!("  {line}");
    }
    if config.verbose > 0 {
        for (index, signal) in shown.iter().enumerate() {
            let rank = format!("{}.", index + 1);
            println!(
                "  {} {}",
                styled(config, &rank, |t| t.dimmed().to_string()),
                signal.explanation
            );
        }
    }
}
