//! Unified diff support for `codesync diff`.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use codesync_core::Config;
use codesync_renderer::Renderer;

use crate::pipeline::plan_tree;
use crate::remote::SourceFetcher;
use crate::rewriter::{Diagnostic, Outcome};
use crate::SyncError;

/// A single document diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Diffs for a tree, plus what a sync would not be able to resolve.
#[derive(Debug, Default)]
pub struct TreeDiff {
    pub diffs: Vec<FileDiff>,
    /// Mismatches and failures, which leave their document untouched.
    pub problems: Vec<(PathBuf, Diagnostic)>,
    pub unreadable: Vec<(PathBuf, SyncError)>,
}

/// Compute what `sync` would change under `root` as unified diffs.
///
/// No files are written. Unchanged documents are omitted.
pub fn diff_tree(
    root: &Path,
    config: &Config,
    fetcher: &dyn SourceFetcher,
    renderer: &Renderer,
    force: bool,
) -> Result<TreeDiff, SyncError> {
    let plan = plan_tree(root, config, fetcher, renderer, force)?;
    let base = if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    };
    let mut out = TreeDiff {
        unreadable: plan.unreadable,
        ..TreeDiff::default()
    };
    for planned in plan.files {
        if planned.changed() {
            let relative = planned.path.strip_prefix(base).unwrap_or(planned.path.as_path());
            out.diffs.push(FileDiff {
                path: planned.path.clone(),
                unified_diff: unified(&planned.original, &planned.outcome.text, relative),
            });
        }
        for diagnostic in planned.outcome.diagnostics {
            if matches!(
                diagnostic.outcome,
                Outcome::Mismatch { .. } | Outcome::Failed(_)
            ) {
                out.problems.push((planned.path.clone(), diagnostic));
            }
        }
    }
    Ok(out)
}

/// Unified diff of `old` against `new` with `a/` and `b/` headers.
pub fn unified(old: &str, new: &str, relative: &Path) -> String {
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}
