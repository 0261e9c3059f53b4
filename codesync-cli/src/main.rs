//! codesync keeps code samples in documentation pages in sync with the
//! files they quote.
//!
//! # Usage
//!
//! ```text
//! codesync sync  [DIR] [--check] [--force]
//! codesync strip [DIR] [--dry-run]
//! codesync diff  [DIR] [--force]
//! codesync list  [DIR] [--json]
//! ```
//!
//! Exit status: `0` clean, `1` mismatches, per-directive or per-file errors
//! (and pending changes under `sync --check`), `2` fatal.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{
    diff::DiffArgs, list::ListArgs, strip::StripArgs, sync::SyncArgs, GlobalArgs, Status,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "codesync",
    version,
    about = "Synchronise code samples in MDX pages with their source files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch referenced lines and regenerate code blocks.
    Sync(SyncArgs),

    /// Remove every generated code block and clear stored digests.
    Strip(StripArgs),

    /// Show unified diff of what sync would write.
    Diff(DiffArgs),

    /// List directives and their state without fetching anything.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<Status> {
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Strip(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::List(args) => args.run(&cli.global),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    match run(cli) {
        Ok(Status::Clean) => ExitCode::SUCCESS,
        Ok(Status::Problems) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
