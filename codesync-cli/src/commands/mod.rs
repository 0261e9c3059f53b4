//! Subcommands and the setup they share.

pub mod diff;
pub mod list;
pub mod strip;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use codesync_core::Config;
use codesync_renderer::Renderer;
use codesync_sync::{rewriter::short, Diagnostic, Outcome, Summary};

/// Flags accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Config file (default: ./codesync.yaml if present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, global = true, value_name = "URL")]
    pub api_root: Option<String>,

    /// Override the git ref files are fetched at.
    #[arg(long = "ref", global = true, value_name = "REF")]
    pub git_ref: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How a command finished, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    Problems,
}

impl Status {
    pub fn from_problems(problems: bool) -> Self {
        if problems {
            Status::Problems
        } else {
            Status::Clean
        }
    }
}

impl GlobalArgs {
    /// Load the config file and apply command-line overrides.
    pub fn config(&self) -> Result<Config> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let mut config = Config::discover(self.config.as_deref(), &cwd)?;
        if let Some(api_root) = &self.api_root {
            config.api_root = api_root.clone();
        }
        if let Some(git_ref) = &self.git_ref {
            config.git_ref = git_ref.clone();
        }
        Ok(config)
    }
}

/// Target directory: the positional argument, else the configured docs root.
pub fn target_dir(dir: Option<PathBuf>, config: &Config) -> PathBuf {
    dir.unwrap_or_else(|| config.docs_root.clone())
}

pub fn renderer(config: &Config) -> Result<Renderer> {
    Renderer::with_template(config.template.as_deref()).with_context(|| match &config.template {
        Some(path) => format!("failed to load template {}", path.display()),
        None => "failed to load the built-in template".to_string(),
    })
}

/// Path shown to the user, relative to `root` when possible.
pub fn display_path<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

/// One line per directive outcome.
pub fn print_diagnostic(path: &Path, root: &Path, diagnostic: &Diagnostic) {
    let location = format!("{}:{}", display_path(path, root), diagnostic.line);
    let sources = diagnostic.sources.join(", ");
    match &diagnostic.outcome {
        Outcome::Inserted { digest } => println!(
            "  {} {location} inserted {sources} ({})",
            "+".green().bold(),
            short(digest)
        ),
        Outcome::UpToDate => println!("  {} {location} up to date", "·".bright_black()),
        Outcome::Overwritten { previous, digest } => println!(
            "  {} {location} overwritten {sources} ({} -> {})",
            "!".yellow().bold(),
            short(previous),
            short(digest)
        ),
        Outcome::Mismatch { stored, computed } => println!(
            "  {} {location} {} {sources} (stored {}, remote {}); rerun with --force to overwrite",
            "✗".red().bold(),
            "mismatch".red(),
            short(stored),
            short(computed)
        ),
        Outcome::Failed(failure) => println!(
            "  {} {location} {} {failure}",
            "✗".red().bold(),
            "error".red()
        ),
    }
}

pub fn print_summary(summary: &Summary, prefix: &str) {
    let line = format!(
        "{prefix}{} file(s), {} directive(s): {} inserted, {} up to date, {} overwritten, {} mismatched, {} failed",
        summary.files,
        summary.directives,
        summary.inserted,
        summary.up_to_date,
        summary.overwritten,
        summary.mismatched,
        summary.failed,
    );
    if summary.mismatched + summary.failed + summary.file_errors > 0 {
        println!("{}", line.red());
    } else {
        println!("{}", line.green());
    }
}
