//! Tera rendering engine for the generated code container.
//!
//! The embedded template produces:
//!
//! ```text
//! <CodeGroup dynamic hasCopy>
//!
//! <DocsCode hosted={true}>
//! 	```py copy filename="file.py"
//! 	a
//! 	b
//! 	```
//! </DocsCode>
//!
//! </CodeGroup>
//! ```
//!
//! A user template may replace it; it must keep the `<CodeGroup dynamic`
//! opening tag and a `</CodeGroup>` closing tag at line start, otherwise the
//! next run cannot find and strip the generated block.

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::BlockContext;
use crate::error::RenderError;

/// Name under which the container template is registered.
pub const CONTAINER_TEMPLATE: &str = "code_group.mdx.tera";

const EMBEDDED: &str = include_str!("templates/code_group.mdx.tera");

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn build_tera(user_template: Option<&Path>) -> Result<Tera, RenderError> {
    let content = match user_template {
        Some(path) => std::fs::read_to_string(path).map_err(|e| io_err(path, e))?,
        None => EMBEDDED.to_string(),
    };
    let mut tera = Tera::default();
    tera.add_raw_template(CONTAINER_TEMPLATE, &content)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders a [`BlockContext`] into the generated container text.
///
/// Create once and reuse for every directive of a run.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Construct a [`Renderer`] with the embedded template.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_template(None)
    }

    /// Construct a [`Renderer`], replacing the embedded template with the
    /// file at `user_template` when given.
    pub fn with_template(user_template: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera(user_template)? })
    }

    /// Render the container. Line endings are normalised to LF and the
    /// trailing newline of the template is dropped.
    pub fn render(&self, ctx: &BlockContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(CONTAINER_TEMPLATE, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n").trim_end_matches('\n').to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
