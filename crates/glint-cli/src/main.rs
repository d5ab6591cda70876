//! Glint CLI - pattern-based scanner for component front-end projects
//!
//! Scans Svelte, Vue and HTML components plus plain scripts and stylesheets
//! for security, lint and accessibility findings.

mod commands;
mod logging;
mod output;

use clap::Parser;
use commands::Commands;
use logging::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "glint",
    author,
    version,
    about = "Fast pattern-based scanner for component front-end projects",
    long_about = "Glint scans Svelte, Vue and HTML components, scripts and stylesheets\n\
                  against a declarative rule catalog.\n\n\
                  Comments never produce findings, and every finding points at the\n\
                  exact line and column of the original file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level for diagnostics written to stderr
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Rules(args) => args.run(),
        Commands::Explain(args) => args.run(),
    }
}
