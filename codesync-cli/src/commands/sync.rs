//! `codesync sync`: fetch referenced lines and regenerate code blocks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use codesync_sync::{
    process_tree, CachingFetcher, GitHubFetcher, SyncOptions, TreeReport, WriteResult,
};

use super::{display_path, print_diagnostic, print_summary, renderer, target_dir, GlobalArgs, Status};

/// Arguments for `codesync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory (or single page) to process; defaults to the configured docs root.
    pub dir: Option<PathBuf>,

    /// Report what would change without writing any files. Pending changes
    /// make the command exit with status 1.
    #[arg(long)]
    pub check: bool,

    /// Overwrite blocks whose remote source has drifted.
    #[arg(long)]
    pub force: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Status> {
        let config = global.config()?;
        let credentials = config.credentials()?;
        let root = target_dir(self.dir, &config);
        let renderer = renderer(&config)?;
        log::info!(
            "fetching from {} at ref {}",
            credentials.api_root,
            credentials.git_ref
        );

        let fetcher = CachingFetcher::new(GitHubFetcher::new(credentials));
        let options = SyncOptions {
            force: self.force,
            dry_run: self.check,
        };
        let report = process_tree(&root, &config, &fetcher, &renderer, options)
            .with_context(|| format!("sync failed for {}", root.display()))?;

        print_report(&report, &root, self.check);

        let pending = self.check && report.summary().changed_files > 0;
        Ok(Status::from_problems(report.has_problems() || pending))
    }
}

fn print_report(report: &TreeReport, root: &std::path::Path, check: bool) {
    let prefix = if check { "[check] " } else { "" };
    for file in &report.files {
        let quiet = file.failure.is_none()
            && !file.write.as_ref().is_some_and(WriteResult::changed)
            && file.diagnostics.is_empty();
        if quiet {
            continue;
        }

        let marker = match (&file.failure, &file.write) {
            (Some(_), _) => "✗".red().bold().to_string(),
            (None, Some(WriteResult::Written { .. })) => "✎".green().to_string(),
            (None, Some(WriteResult::WouldWrite { .. })) => "~".yellow().to_string(),
            _ => "·".bright_black().to_string(),
        };
        println!("{prefix}{marker} {}", display_path(&file.path, root));
        if let Some(err) = &file.failure {
            println!("    {err}");
        }
        for diagnostic in &file.diagnostics {
            print_diagnostic(&file.path, root, diagnostic);
        }
    }
    print_summary(&report.summary(), prefix);
}
