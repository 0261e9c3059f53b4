//! `codesync strip`: remove generated blocks and clear digests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use codesync_sync::{strip_tree, WriteResult};

use super::{display_path, target_dir, GlobalArgs, Status};

/// Arguments for `codesync strip`.
#[derive(Args, Debug)]
pub struct StripArgs {
    /// Directory (or single page) to process; defaults to the configured docs root.
    pub dir: Option<PathBuf>,

    /// Show which files would change without writing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl StripArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Status> {
        let config = global.config()?;
        let root = target_dir(self.dir, &config);
        let report = strip_tree(&root, &config, self.dry_run)
            .with_context(|| format!("strip failed for {}", root.display()))?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for file in &report.files {
            let path = display_path(&file.path, &root);
            match (&file.failure, &file.write) {
                (Some(err), _) => println!("{prefix}✗ {path}: {err}"),
                (None, Some(WriteResult::Written { .. })) => println!("{prefix}✎ {path}"),
                (None, Some(WriteResult::WouldWrite { .. })) => println!("{prefix}~ {path}"),
                _ => {}
            }
        }
        let summary = report.summary();
        println!(
            "{prefix}stripped {} of {} file(s)",
            summary.changed_files, summary.files
        );
        Ok(Status::from_problems(summary.file_errors > 0))
    }
}
