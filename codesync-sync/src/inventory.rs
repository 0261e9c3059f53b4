//! Directive inventory for `codesync list`. Reads documents only; never
//! touches the network.

use std::path::{Path, PathBuf};

use serde::Serialize;

use codesync_core::{Config, Document, Node};

use crate::pipeline::{collect_documents, read_document};
use crate::SyncError;

/// One directive as found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveEntry {
    pub path: PathBuf,
    pub line: usize,
    /// Stored digest, empty when never generated.
    pub digest: String,
    /// Whether a generated container follows the directive.
    pub generated: bool,
    /// `owner/repo:path L1-L2` per reference.
    pub sources: Vec<String>,
    /// Why the directive cannot be synchronised, if it cannot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List every directive in `text`.
pub fn scan_text(path: &Path, text: &str) -> Vec<DirectiveEntry> {
    let doc = Document::parse(text);
    let mut entries: Vec<DirectiveEntry> = Vec::new();
    let mut open: Option<usize> = None;

    for node in &doc.nodes {
        match node {
            Node::Directive(directive) => {
                let (sources, error) = match directive.references() {
                    Ok(refs) => (
                        refs.iter()
                            .map(|r| format!("{} {}", r.remote, r.lines))
                            .collect::<Vec<_>>(),
                        None,
                    ),
                    Err(e) => (Vec::new(), Some(e.to_string())),
                };
                entries.push(DirectiveEntry {
                    path: path.to_path_buf(),
                    line: directive.line,
                    digest: directive.digest().to_string(),
                    generated: false,
                    sources,
                    error,
                });
                open = Some(entries.len() - 1);
            }
            Node::Generated(_) => {
                if let Some(entry) = open.take().and_then(|i| entries.get_mut(i)) {
                    entry.generated = true;
                }
            }
            Node::Text(range) => {
                if !doc.slice(range).trim().is_empty() {
                    open = None;
                }
            }
        }
    }
    entries
}

/// Directives found under a root, plus the pages that could not be read.
#[derive(Debug, Default)]
pub struct Inventory {
    pub entries: Vec<DirectiveEntry>,
    pub unreadable: Vec<(PathBuf, SyncError)>,
}

/// List every directive under `root`. Only an unreadable root is an error.
pub fn scan_tree(root: &Path, config: &Config) -> Result<Inventory, SyncError> {
    let mut inventory = Inventory::default();
    for path in collect_documents(root, config)? {
        match read_document(&path) {
            Ok(text) => inventory.entries.extend(scan_text(&path, &text)),
            Err(err) => {
                tracing::warn!("{err}");
                inventory.unreadable.push((path, err));
            }
        }
    }
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_pending_generated_and_broken_directives() {
        let text = "\
<GithubCodeSegment digest=\"\">
  <CodeSegment path=\"https://github.com/o/r/blob/main/a.py\" lineStart={1} lineEnd={3} />
</GithubCodeSegment>

<GithubCodeSegment digest=\"abc\">
  <CodeSegment path=\"https://github.com/o/r/blob/main/b.rs\" lineStart={2} lineEnd={2} />
</GithubCodeSegment>

<CodeGroup dynamic hasCopy>
</CodeGroup>

<GithubCodeSegment digest=\"\">
  <CodeSegment lineStart={1} lineEnd={2} />
</GithubCodeSegment>
";
        let entries = scan_text(Path::new("p.mdx"), text);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].line, 1);
        assert!(!entries[0].generated);
        assert_eq!(entries[0].sources, ["o/r:a.py L1-L3"]);

        assert_eq!(entries[1].digest, "abc");
        assert!(entries[1].generated);

        assert!(entries[2].error.is_some());
        assert!(entries[2].sources.is_empty());
    }

    #[test]
    fn unreadable_page_does_not_hide_the_others() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a.mdx"),
            "<GithubCodeSegment digest=\"\">\n  <CodeSegment path=\"https://github.com/o/r/blob/main/a.py\" lineStart={1} lineEnd={1} />\n</GithubCodeSegment>\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("b.mdx"), [0xff, 0xfe, 0x0a]).unwrap();

        let inventory = scan_tree(dir.path(), &Config::default()).unwrap();
        assert_eq!(inventory.entries.len(), 1);
        assert_eq!(inventory.entries[0].path, dir.path().join("a.mdx"));
        assert_eq!(inventory.unreadable.len(), 1);
        assert_eq!(inventory.unreadable[0].0, dir.path().join("b.mdx"));
        assert!(matches!(inventory.unreadable[0].1, SyncError::Io { .. }));
    }
}
