//! Strip and sync passes over a single document.
//!
//! Both passes are pure text-to-text functions; nothing here touches the
//! filesystem.
//!
//! ## `strip`
//!
//! Removes every generated `<CodeGroup dynamic>` container together with the
//! whitespace before it, collapses the blank lines left at the seam, and
//! resets each directive's `digest` to `""`. [`strip_report`] also returns
//! what was removed from each directive (its [`Baseline`]).
//!
//! ## `sync`
//!
//! Rebuilds the stripped document left to right. For each directive:
//!
//! | stored digest        | result                                   |
//! |----------------------|------------------------------------------|
//! | empty                | insert block, stamp digest (`Inserted`)  |
//! | equal to computed    | re-emit block (`UpToDate`)               |
//! | different, `force`   | replace block, restamp (`Overwritten`)   |
//! | different            | restore old block and digest (`Mismatch`)|
//! | fetch/parse failure  | restore old block and digest (`Failed`)  |

use codesync_core::document::{Directive, Document, Node, DIGEST_ATTR};
use codesync_core::tag::set_attribute;
use codesync_renderer::{BlockContext, Renderer, SegmentCtx};

use crate::digest::digest;
use crate::error::DirectiveFailure;
use crate::remote::SourceFetcher;

// ---------------------------------------------------------------------------
// Strip
// ---------------------------------------------------------------------------

/// What `strip` removed from one directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Digest stored in the directive before stripping.
    pub digest: String,
    /// The generated container that followed the directive, if any.
    pub block: Option<String>,
    /// 1-based line of the directive in the unstripped document.
    pub line: usize,
    /// Whitespace between the directive and its block.
    pub gap: String,
    /// Whitespace that followed the block, before the seam was collapsed.
    pub trailing: Option<String>,
}

/// A stripped document plus one [`Baseline`] per directive, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub text: String,
    pub baselines: Vec<Baseline>,
}

/// Remove all generated content and clear every stored digest.
pub fn strip(text: &str) -> String {
    strip_report(text).text
}

/// [`strip`], also reporting what was removed per directive.
pub fn strip_report(text: &str) -> Stripped {
    let doc = Document::parse(text);
    let mut out = String::with_capacity(text.len());
    let mut baselines: Vec<Baseline> = Vec::new();
    // Directive a following generated block belongs to, while only
    // whitespace separates them.
    let mut owner: Option<usize> = None;
    // Directive whose block was removed just before the next text chunk.
    let mut seam_owner: Option<usize> = None;
    let mut at_seam = false;

    for node in &doc.nodes {
        match node {
            Node::Text(range) => {
                let chunk = doc.slice(range);
                if at_seam {
                    if let Some(baseline) = seam_owner.take().and_then(|i| baselines.get_mut(i)) {
                        baseline.trailing = Some(leading_whitespace(chunk).to_string());
                    }
                    out.push_str(&collapse_leading_blank_lines(chunk));
                    at_seam = false;
                } else {
                    out.push_str(chunk);
                }
                if !chunk.trim().is_empty() {
                    owner = None;
                }
            }
            Node::Directive(directive) => {
                out.push_str(&directive_text(&doc, directive, ""));
                baselines.push(Baseline {
                    digest: directive.digest().to_string(),
                    line: directive.line,
                    ..Baseline::default()
                });
                owner = Some(baselines.len() - 1);
                seam_owner = None;
                at_seam = false;
            }
            Node::Generated(range) => {
                let block = doc.slice(range);
                let kept = out.trim_end().len();
                let gap = out[kept..].to_string();
                out.truncate(kept);
                seam_owner = None;
                match owner.and_then(|i| baselines.get_mut(i).map(|b| (i, b))) {
                    Some((i, baseline)) if baseline.block.is_none() => {
                        baseline.block = Some(block.to_string());
                        baseline.gap = gap;
                        seam_owner = Some(i);
                    }
                    _ => tracing::debug!(
                        "dropping generated block at line {} with no directive",
                        codesync_core::document::line_of(doc.source, range.start)
                    ),
                }
                at_seam = true;
            }
        }
    }

    Stripped {
        text: out,
        baselines,
    }
}

/// Directive source with its `digest` attribute set to `digest`. A directive
/// that never had the attribute is left alone when `digest` is empty.
fn directive_text(doc: &Document<'_>, directive: &Directive, digest: &str) -> String {
    let open = doc.slice(&directive.open.span);
    let rest = &doc.source[directive.open.span.end..directive.span.end];
    if digest.is_empty() && !directive.open.has(DIGEST_ATTR) {
        return format!("{open}{rest}");
    }
    format!("{}{rest}", set_attribute(open, DIGEST_ATTR, digest))
}

fn leading_whitespace(chunk: &str) -> &str {
    &chunk[..chunk.len() - chunk.trim_start().len()]
}

/// Reduce a leading whitespace run spanning two or more line breaks to a
/// single blank line, keeping the indentation of the following line.
fn collapse_leading_blank_lines(chunk: &str) -> String {
    let body = chunk.trim_start();
    let ws = &chunk[..chunk.len() - body.len()];
    if ws.matches('\n').count() < 2 {
        return chunk.to_string();
    }
    let indent = ws.rsplit('\n').next().unwrap_or("");
    if body.is_empty() {
        // Seam at end of document.
        return "\n".to_string();
    }
    format!("\n\n{indent}{body}")
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Outcome for one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// First generation; block inserted and digest stamped.
    Inserted { digest: String },
    /// Stored digest matches the remote source.
    UpToDate,
    /// Remote source drifted; directive left unmodified.
    Mismatch { stored: String, computed: String },
    /// Remote source drifted; block replaced because `force` was set.
    Overwritten { previous: String, digest: String },
    /// Directive skipped.
    Failed(DirectiveFailure),
}

/// Outcome of one directive plus where it is and what it quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    /// `owner/repo:path L1-L2` for every reference that parsed.
    pub sources: Vec<String>,
    pub outcome: Outcome,
}

/// Rewritten text plus one diagnostic per directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewriter configuration and collaborators.
pub struct Rewriter<'a> {
    fetcher: &'a dyn SourceFetcher,
    renderer: &'a Renderer,
    indent: String,
    force: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(fetcher: &'a dyn SourceFetcher, renderer: &'a Renderer) -> Self {
        Rewriter {
            fetcher,
            renderer,
            indent: "\t".to_string(),
            force: false,
        }
    }

    /// Prefix applied to every code line.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Overwrite drifted blocks instead of reporting them.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Synchronise every directive in `text`.
    pub fn sync(&self, text: &str) -> SyncOutcome {
        self.sync_stripped(&strip_report(text))
    }

    /// Synchronise an already stripped document against its baselines.
    pub fn sync_stripped(&self, stripped: &Stripped) -> SyncOutcome {
        let doc = Document::parse(&stripped.text);
        let mut out = String::with_capacity(stripped.text.len() * 2);
        let mut diagnostics = Vec::new();
        let mut index = 0usize;
        let mut seam = Seam::Plain;

        for node in &doc.nodes {
            match node {
                Node::Text(range) => {
                    let chunk = doc.slice(range);
                    match std::mem::replace(&mut seam, Seam::Plain) {
                        Seam::Plain => out.push_str(chunk),
                        Seam::Collapse => out.push_str(&collapse_leading_blank_lines(chunk)),
                        Seam::Restore(ws) => {
                            out.push_str(&ws);
                            out.push_str(chunk.trim_start());
                        }
                    }
                }
                Node::Generated(range) => {
                    // Not produced by strip_report; keep verbatim.
                    out.push_str(doc.slice(range));
                    seam = Seam::Plain;
                }
                Node::Directive(directive) => {
                    let baseline = stripped.baselines.get(index).cloned().unwrap_or_else(|| {
                        Baseline {
                            line: directive.line,
                            ..Baseline::default()
                        }
                    });
                    index += 1;

                    // An existing block keeps the whitespace it had on disk.
                    let (gap, next_seam) = match &baseline.block {
                        Some(_) => (
                            baseline.gap.clone(),
                            baseline.trailing.clone().map_or(Seam::Collapse, Seam::Restore),
                        ),
                        None => ("\n\n".to_string(), Seam::Collapse),
                    };
                    let (emitted, diagnostic) = self.sync_directive(&doc, directive, baseline);
                    out.push_str(&emitted.directive);
                    seam = Seam::Plain;
                    if let Some(block) = emitted.block {
                        out.push_str(&gap);
                        out.push_str(&block);
                        seam = next_seam;
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }

        SyncOutcome {
            text: out,
            diagnostics,
        }
    }

    fn sync_directive(
        &self,
        doc: &Document<'_>,
        directive: &Directive,
        baseline: Baseline,
    ) -> (Emitted, Diagnostic) {
        let sources = directive
            .references()
            .map(|refs| {
                refs.iter()
                    .map(|r| format!("{} {}", r.remote, r.lines))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let diagnostic = |outcome| Diagnostic {
            line: baseline.line,
            sources,
            outcome,
        };

        let rendered = match self.render(directive) {
            Ok(block) => block,
            Err(failure) => {
                tracing::warn!("line {}: {failure}", baseline.line);
                let emitted = Emitted::restore(doc, directive, &baseline);
                return (emitted, diagnostic(Outcome::Failed(failure)));
            }
        };
        let computed = digest(&rendered);
        let fresh = Emitted {
            directive: directive_text(doc, directive, &computed),
            block: Some(rendered),
        };

        let outcome = if baseline.digest.is_empty() {
            Outcome::Inserted { digest: computed }
        } else if baseline.digest == computed {
            Outcome::UpToDate
        } else if self.force {
            Outcome::Overwritten {
                previous: baseline.digest.clone(),
                digest: computed,
            }
        } else {
            tracing::warn!(
                "line {}: remote source drifted (stored {}, computed {})",
                baseline.line,
                short(&baseline.digest),
                short(&computed)
            );
            let emitted = Emitted::restore(doc, directive, &baseline);
            return (
                emitted,
                diagnostic(Outcome::Mismatch {
                    stored: baseline.digest.clone(),
                    computed,
                }),
            );
        };
        tracing::debug!("line {}: {:?}", baseline.line, outcome);
        (fresh, diagnostic(outcome))
    }

    /// Fetch, select and render every reference of `directive`.
    fn render(&self, directive: &Directive) -> Result<String, DirectiveFailure> {
        let references = directive.references()?;
        let mut segments = Vec::with_capacity(references.len());
        for reference in &references {
            let content = self
                .fetcher
                .fetch(&reference.remote)
                .map_err(|source| DirectiveFailure::Fetch {
                    remote: reference.remote.clone(),
                    source,
                })?;
            let content = content.replace("\r\n", "\n");
            let lines = reference.lines.select(&content)?;
            segments.push(SegmentCtx::new(reference, &lines, &self.indent));
        }
        self.renderer
            .render(&BlockContext { segments })
            .map_err(|e| DirectiveFailure::Render(e.to_string()))
    }
}

/// How to emit the whitespace at the start of the next text chunk.
enum Seam {
    Plain,
    Collapse,
    Restore(String),
}

/// Text emitted for one directive.
struct Emitted {
    directive: String,
    block: Option<String>,
}

impl Emitted {
    /// The directive exactly as it was before stripping.
    fn restore(doc: &Document<'_>, directive: &Directive, baseline: &Baseline) -> Self {
        Emitted {
            directive: directive_text(doc, directive, &baseline.digest),
            block: baseline.block.clone(),
        }
    }
}

/// First 12 hex characters of a digest, for log lines.
pub fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
