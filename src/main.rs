use std::io::IsTerminal;

use clap::Parser;

use tangle::adapter::inbound::cli::command::{Cli, ColorChoice, Commands};
use tangle::adapter::inbound::cli::output::{self, OutputConfig};
use tangle::adapter::inbound::cli::{check, scan};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal(),
    };
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose, color));

    let result = match &cli.command {
        Commands::Scan(args) => scan::execute(args).await,
        Commands::CheckConfig(args) => check::execute(args),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
