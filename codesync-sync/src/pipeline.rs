//! Tree-level entrypoints shared by every CLI command.
//!
//! A run has two passes. The first reads every document under the root and
//! takes a stripped snapshot of it; the second synchronises each snapshot
//! against the baselines recorded while stripping. Writes happen only after
//! a file's new text is complete, one atomic rename per changed file.

use std::path::{Path, PathBuf};

use codesync_core::Config;
use codesync_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::remote::SourceFetcher;
use crate::rewriter::{strip_report, Diagnostic, Outcome, Rewriter, Stripped, SyncOutcome};
use crate::writer::{atomic_write, WriteResult};

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Every document under `root`, sorted by path. Hidden entries,
/// [`SKIPPED_DIRS`] and symlinked directories are ignored. A file given as `root` is returned as is.
pub fn collect_documents(root: &Path, config: &Config) -> Result<Vec<PathBuf>, SyncError> {
    let meta = std::fs::metadata(root).map_err(|e| io_err(root, e))?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut out = Vec::new();
    walk(root, config, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, config: &Config, out: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_ref()) {
                walk(&path, config, out)?;
            }
        } else if config.is_document(&path) {
            out.push(path);
        }
    }
    Ok(())
}

pub(crate) fn read_document(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path)
        .map(|text| text.replace("\r\n", "\n"))
        .map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Options for [`process_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Overwrite drifted blocks.
    pub force: bool,
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

/// Result for one document.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// `None` when the file could not be read or written.
    pub write: Option<WriteResult>,
    pub failure: Option<SyncError>,
}

/// Per-outcome totals across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub changed_files: usize,
    pub directives: usize,
    pub inserted: usize,
    pub up_to_date: usize,
    pub mismatched: usize,
    pub overwritten: usize,
    pub failed: usize,
    pub file_errors: usize,
}

/// Result of a whole run.
#[derive(Debug, Default)]
pub struct TreeReport {
    pub files: Vec<FileReport>,
}

impl TreeReport {
    pub fn summary(&self) -> Summary {
        let mut s = Summary {
            files: self.files.len(),
            ..Summary::default()
        };
        for file in &self.files {
            if file.failure.is_some() {
                s.file_errors += 1;
            }
            if file.write.as_ref().is_some_and(WriteResult::changed) {
                s.changed_files += 1;
            }
            for d in &file.diagnostics {
                s.directives += 1;
                match d.outcome {
                    Outcome::Inserted { .. } => s.inserted += 1,
                    Outcome::UpToDate => s.up_to_date += 1,
                    Outcome::Mismatch { .. } => s.mismatched += 1,
                    Outcome::Overwritten { .. } => s.overwritten += 1,
                    Outcome::Failed(_) => s.failed += 1,
                }
            }
        }
        s
    }

    /// Any drift, directive failure or file error.
    pub fn has_problems(&self) -> bool {
        let s = self.summary();
        s.mismatched + s.failed + s.file_errors > 0
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// A document with its synchronised text computed but not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub original: String,
    pub outcome: SyncOutcome,
}

impl PlannedFile {
    pub fn changed(&self) -> bool {
        self.original != self.outcome.text
    }
}

/// Planned documents plus the ones that could not be read.
#[derive(Debug, Default)]
pub struct Plan {
    pub files: Vec<PlannedFile>,
    pub unreadable: Vec<(PathBuf, SyncError)>,
}

/// Compute the synchronised text of every document under `root`.
pub fn plan_tree(
    root: &Path,
    config: &Config,
    fetcher: &dyn SourceFetcher,
    renderer: &Renderer,
    force: bool,
) -> Result<Plan, SyncError> {
    let paths = collect_documents(root, config)?;
    tracing::info!("{} document(s) under {}", paths.len(), root.display());

    let mut plan = Plan::default();
    let mut snapshots: Vec<(PathBuf, String, Stripped)> = Vec::with_capacity(paths.len());
    for path in paths {
        match read_document(&path) {
            Ok(original) => {
                let stripped = strip_report(&original);
                snapshots.push((path, original, stripped));
            }
            Err(err) => {
                tracing::warn!("{err}");
                plan.unreadable.push((path, err));
            }
        }
    }

    let rewriter = Rewriter::new(fetcher, renderer)
        .indent(config.indent.clone())
        .force(force);
    for (path, original, stripped) in snapshots {
        if stripped.baselines.is_empty() {
            tracing::debug!("no directives: {}", path.display());
        }
        let outcome = rewriter.sync_stripped(&stripped);
        plan.files.push(PlannedFile {
            path,
            original,
            outcome,
        });
    }
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Entrypoints
// ---------------------------------------------------------------------------

/// Synchronise every document under `root` and write the changed ones.
///
/// Only an unreadable root aborts the run; per-file and per-directive
/// problems are collected in the report.
pub fn process_tree(
    root: &Path,
    config: &Config,
    fetcher: &dyn SourceFetcher,
    renderer: &Renderer,
    options: SyncOptions,
) -> Result<TreeReport, SyncError> {
    let plan = plan_tree(root, config, fetcher, renderer, options.force)?;
    let mut report = TreeReport::default();

    for (path, err) in plan.unreadable {
        report.files.push(FileReport {
            path,
            diagnostics: Vec::new(),
            write: None,
            failure: Some(err),
        });
    }

    for planned in plan.files {
        let (write, failure) = match atomic_write(&planned.path, &planned.outcome.text, options.dry_run) {
            Ok(result) => (Some(result), None),
            Err(err) => {
                tracing::warn!("{err}");
                (None, Some(err))
            }
        };
        report.files.push(FileReport {
            path: planned.path,
            diagnostics: planned.outcome.diagnostics,
            write,
            failure,
        });
    }

    report.files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(report)
}

/// Remove generated content from every document under `root`.
pub fn strip_tree(root: &Path, config: &Config, dry_run: bool) -> Result<TreeReport, SyncError> {
    let paths = collect_documents(root, config)?;
    let mut report = TreeReport::default();
    for path in paths {
        let result = read_document(&path).and_then(|text| {
            let stripped = strip_report(&text).text;
            atomic_write(&path, &stripped, dry_run)
        });
        let (write, failure) = match result {
            Ok(result) => (Some(result), None),
            Err(err) => {
                tracing::warn!("{err}");
                (None, Some(err))
            }
        };
        report.files.push(FileReport {
            path,
            diagnostics: Vec::new(),
            write,
            failure,
        });
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryFetcher;
    use std::fs;
    use tempfile::TempDir;

    fn page(start: usize, end: usize) -> String {
        format!(
            "# Page\n\n<GithubCodeSegment digest=\"\">\n  <CodeSegment path=\"https://github.com/o/r/blob/main/f.py\" lineStart={{{start}}} lineEnd={{{end}}} />\n</GithubCodeSegment>\n"
        )
    }

    #[test]
    fn collect_skips_hidden_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("guide")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("b.mdx"), "").unwrap();
        fs::write(dir.path().join("guide/a.md"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join(".git/x.md"), "").unwrap();
        fs::write(dir.path().join("node_modules/pkg/readme.md"), "").unwrap();

        let found = collect_documents(dir.path(), &Config::default()).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(rel, [PathBuf::from("b.mdx"), PathBuf::from("guide/a.md")]);
    }

    #[cfg(unix)]
    #[test]
    fn collect_does_not_follow_symlinked_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/a.mdx"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/a.mdx"), dir.path().join("b.mdx"))
            .unwrap();

        let found = collect_documents(dir.path(), &Config::default()).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(rel, [PathBuf::from("b.mdx"), PathBuf::from("real/a.mdx")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_documents(&dir.path().join("nope"), &Config::default()).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn process_tree_writes_then_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.mdx");
        fs::write(&path, page(1, 2)).unwrap();
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("o/r/f.py", "a\nb\nc");
        let renderer = Renderer::new().unwrap();
        let config = Config::default();

        let first = process_tree(dir.path(), &config, &fetcher, &renderer, SyncOptions::default())
            .unwrap();
        assert_eq!(first.summary().inserted, 1);
        assert_eq!(first.summary().changed_files, 1);
        assert!(!first.has_problems());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<CodeGroup dynamic"));

        let second = process_tree(dir.path(), &config, &fetcher, &renderer, SyncOptions::default())
            .unwrap();
        assert_eq!(second.summary().up_to_date, 1);
        assert_eq!(second.summary().changed_files, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.mdx");
        fs::write(&path, page(1, 1)).unwrap();
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("o/r/f.py", "a");
        let renderer = Renderer::new().unwrap();

        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };
        let report =
            process_tree(dir.path(), &Config::default(), &fetcher, &renderer, options).unwrap();
        assert!(matches!(
            report.files[0].write,
            Some(WriteResult::WouldWrite { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), page(1, 1));
    }

    #[test]
    fn one_bad_directive_does_not_stop_the_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.mdx"), page(5, 9)).unwrap();
        fs::write(dir.path().join("good.mdx"), page(1, 1)).unwrap();
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("o/r/f.py", "a\nb");
        let renderer = Renderer::new().unwrap();

        let report = process_tree(
            dir.path(),
            &Config::default(),
            &fetcher,
            &renderer,
            SyncOptions::default(),
        )
        .unwrap();
        let s = report.summary();
        assert_eq!((s.inserted, s.failed), (1, 1));
        assert!(report.has_problems());
        assert_eq!(
            fs::read_to_string(dir.path().join("bad.mdx")).unwrap(),
            page(5, 9)
        );
    }

    #[test]
    fn strip_tree_restores_authored_pages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.mdx");
        fs::write(&path, page(1, 2)).unwrap();
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("o/r/f.py", "a\nb");
        let renderer = Renderer::new().unwrap();
        process_tree(
            dir.path(),
            &Config::default(),
            &fetcher,
            &renderer,
            SyncOptions::default(),
        )
        .unwrap();

        let report = strip_tree(dir.path(), &Config::default(), false).unwrap();
        assert_eq!(report.summary().changed_files, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), page(1, 2));
    }
}
