//! `codesync diff`: show unified diffs for what sync would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use codesync_sync::{diff_tree, CachingFetcher, GitHubFetcher};

use super::{print_diagnostic, renderer, target_dir, GlobalArgs, Status};

/// Arguments for `codesync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Directory (or single page) to diff; defaults to the configured docs root.
    pub dir: Option<PathBuf>,

    /// Include blocks whose remote source has drifted.
    #[arg(long)]
    pub force: bool,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Status> {
        let config = global.config()?;
        let credentials = config.credentials()?;
        let root = target_dir(self.dir, &config);
        let renderer = renderer(&config)?;
        let fetcher = CachingFetcher::new(GitHubFetcher::new(credentials));

        let result = diff_tree(&root, &config, &fetcher, &renderer, self.force)
            .with_context(|| format!("diff failed for {}", root.display()))?;

        for (path, err) in &result.unreadable {
            eprintln!("✗ {}: {err}", path.display());
        }

        if result.diffs.is_empty() {
            println!("No differences under {}.", root.display());
        }

        for diff in &result.diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        for (path, diagnostic) in &result.problems {
            print_diagnostic(path, &root, diagnostic);
        }

        Ok(Status::from_problems(
            !result.problems.is_empty() || !result.unreadable.is_empty(),
        ))
    }
}
