//! Template context: serializable rendering payload built from segment
//! references and the lines selected from their remote files.

use serde::{Deserialize, Serialize};

use codesync_core::types::SegmentReference;

use crate::error::RenderError;

/// Payload for the container template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockContext {
    /// One entry per segment reference, in directive order.
    pub segments: Vec<SegmentCtx>,
}

/// One fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentCtx {
    pub filename: String,
    pub language: String,
    pub hosted: bool,
    pub indent: String,
    /// Selected lines, each prefixed with `indent`, joined by `\n`.
    pub body: String,
}

impl SegmentCtx {
    /// Build the context for `reference` from its already-selected `lines`.
    pub fn new(reference: &SegmentReference, lines: &[&str], indent: &str) -> Self {
        let body = lines
            .iter()
            .map(|line| format!("{indent}{}", line.trim_end_matches('\r')))
            .collect::<Vec<_>>()
            .join("\n");
        SegmentCtx {
            filename: reference.filename.clone(),
            language: language_for(&reference.filename).to_string(),
            hosted: reference.hosted,
            indent: indent.to_string(),
            body,
        }
    }
}

impl BlockContext {
    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// Fence language tag for `filename`, inferred from its extension.
///
/// Unknown extensions are used verbatim; files without one get `text`.
pub fn language_for(filename: &str) -> &str {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return "text";
    };
    match ext {
        "py" => "py",
        "rs" => "rust",
        "ts" | "tsx" => "ts",
        "js" | "jsx" | "mjs" | "cjs" => "js",
        "go" => "go",
        "sh" | "bash" => "bash",
        "yml" | "yaml" => "yaml",
        "json" => "json",
        "toml" => "toml",
        "md" | "mdx" => "markdown",
        "" => "text",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesync_core::types::{LineRange, RemotePath};

    fn reference(filename: &str) -> SegmentReference {
        SegmentReference {
            remote: RemotePath {
                owner: "o".to_string(),
                repo: "r".to_string(),
                path: filename.to_string(),
            },
            lines: LineRange { start: 1, end: 2 },
            filename: filename.to_string(),
            hosted: true,
        }
    }

    #[test]
    fn body_prefixes_every_line() {
        let ctx = SegmentCtx::new(&reference("a.py"), &["x = 1", "", "y = 2"], "\t");
        assert_eq!(ctx.body, "\tx = 1\n\t\n\ty = 2");
        assert_eq!(ctx.language, "py");
        assert!(ctx.hosted);
    }

    #[test]
    fn carriage_returns_are_dropped() {
        let ctx = SegmentCtx::new(&reference("a.py"), &["a\r", "b\r"], "  ");
        assert_eq!(ctx.body, "  a\n  b");
    }

    #[test]
    fn language_inference() {
        assert_eq!(language_for("main.rs"), "rust");
        assert_eq!(language_for("index.tsx"), "ts");
        assert_eq!(language_for("Makefile"), "text");
        assert_eq!(language_for("query.sql"), "sql");
        assert_eq!(language_for("trailing."), "text");
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = BlockContext {
            segments: vec![SegmentCtx::new(&reference("a.py"), &["a"], "\t")],
        };
        ctx.to_tera_context().expect("context conversion");
    }
}
