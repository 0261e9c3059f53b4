//! Document scanner: splits an MDX page into plain text, directives and
//! previously generated containers.
//!
//! # Recognised markup
//!
//! ```text
//! <GithubCodeSegment digest="…">           directive (paired form)
//!   <CodeSegment path=… lineStart={…} lineEnd={…} hosted={…} />
//! </GithubCodeSegment>
//!
//! <GithubCodeSegment digest="…" path=… … /> directive (legacy self-closing form)
//!
//! <CodeGroup dynamic …>                     generated container
//! …
//! </CodeGroup>                              (closing tag at line start)
//! ```
//!
//! Markup inside fenced code blocks (```` ``` ```` or `~~~`) and inline code
//! spans is ignored.

use std::ops::Range;

use crate::error::DirectiveError;
use crate::tag::{parse_tag, Tag};
use crate::types::SegmentReference;

/// Tag name of a directive.
pub const DIRECTIVE_TAG: &str = "GithubCodeSegment";
/// Tag name of a segment reference nested in a directive.
pub const SEGMENT_TAG: &str = "CodeSegment";
/// Tag name of the generated container.
pub const CONTAINER_TAG: &str = "CodeGroup";
/// Attribute marking a container as generated.
pub const GENERATED_MARKER: &str = "dynamic";
/// Directive attribute holding the stored digest.
pub const DIGEST_ATTR: &str = "digest";

const DIRECTIVE_CLOSE: &str = "</GithubCodeSegment>";
const CONTAINER_CLOSE: &str = "\n</CodeGroup>";

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// A directive found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The `<GithubCodeSegment …>` tag (span is the opening tag only).
    pub open: Tag,
    /// Nested `<CodeSegment />` tags, or the directive tag itself in the
    /// self-closing form.
    pub segments: Vec<Tag>,
    /// Byte range of the whole directive, opening tag through closing tag.
    pub span: Range<usize>,
    /// 1-based line of the opening tag.
    pub line: usize,
}

impl Directive {
    /// Stored digest, empty when never generated.
    pub fn digest(&self) -> &str {
        self.open.get(DIGEST_ATTR).unwrap_or("")
    }

    /// Parse every segment reference. The first malformed one fails the
    /// whole directive.
    pub fn references(&self) -> Result<Vec<SegmentReference>, DirectiveError> {
        if self.segments.is_empty() {
            return Err(DirectiveError::NoSegments);
        }
        self.segments
            .iter()
            .map(|tag| SegmentReference::from_attributes(&tag.attributes))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One piece of a scanned document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Untouched text.
    Text(Range<usize>),
    /// A hand-authored directive.
    Directive(Directive),
    /// A generated container, `<CodeGroup dynamic …>` through `</CodeGroup>`.
    Generated(Range<usize>),
}

/// A scanned document borrowing its source text.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub source: &'a str,
    pub nodes: Vec<Node>,
}

impl<'a> Document<'a> {
    /// Scan `source`. Never fails: anything unrecognised stays text.
    pub fn parse(source: &'a str) -> Self {
        let nodes = Scanner::new(source).run();
        Document { source, nodes }
    }

    /// Directives in source order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Directive(d) => Some(d),
            _ => None,
        })
    }

    /// Text covered by `range`.
    pub fn slice(&self, range: &Range<usize>) -> &'a str {
        &self.source[range.clone()]
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Fence {
    marker: u8,
    len: usize,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    text_start: usize,
    fence: Option<Fence>,
    nodes: Vec<Node>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src,
            pos: 0,
            text_start: 0,
            fence: None,
            nodes: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Node> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() {
            if self.at_line_start() && self.update_fence() {
                continue;
            }
            if self.fence.is_some() {
                self.skip_line();
                continue;
            }
            if bytes[self.pos] == b'`' {
                self.skip_code_span();
                continue;
            }
            if bytes[self.pos] == b'<' {
                if let Some(tag) = parse_tag(self.src, self.pos) {
                    if self.try_directive(&tag) || self.try_generated(&tag) {
                        continue;
                    }
                }
            }
            self.pos += 1;
        }
        self.flush_text(self.src.len());
        self.nodes
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.src.as_bytes()[self.pos - 1] == b'\n'
    }

    fn skip_line(&mut self) {
        self.pos = match self.src[self.pos..].find('\n') {
            Some(offset) => self.pos + offset + 1,
            None => self.src.len(),
        };
    }

    /// Step over an inline code span opened at the current backtick run. An
    /// unmatched run is literal text. Spans never cross a blank line.
    fn skip_code_span(&mut self) {
        let bytes = self.src.as_bytes();
        let open = bytes[self.pos..].iter().take_while(|b| **b == b'`').count();
        let body = self.pos + open;
        let limit = self.src[body..]
            .find("\n\n")
            .map_or(self.src.len(), |offset| body + offset);

        let mut at = body;
        while at < limit {
            if bytes[at] != b'`' {
                at += 1;
                continue;
            }
            let run = bytes[at..limit].iter().take_while(|b| **b == b'`').count();
            if run == open {
                self.pos = at + run;
                return;
            }
            at += run;
        }
        self.pos = body;
    }

    /// Open or close a fenced code block at the current line. Returns `true`
    /// when the line was a fence line (and has been consumed).
    fn update_fence(&mut self) -> bool {
        let line_end = self.src[self.pos..]
            .find('\n')
            .map_or(self.src.len(), |offset| self.pos + offset);
        let line = self.src[self.pos..line_end].trim_start();
        let Some(marker) = line.bytes().next().filter(|b| matches!(b, b'`' | b'~')) else {
            return false;
        };
        let len = line.bytes().take_while(|b| *b == marker).count();
        if len < 3 {
            return false;
        }
        match &self.fence {
            Some(open) => {
                let rest = &line[len..];
                if marker != open.marker || len < open.len || !rest.trim().is_empty() {
                    return false;
                }
                self.fence = None;
            }
            None => self.fence = Some(Fence { marker, len }),
        }
        self.skip_line();
        true
    }

    fn try_directive(&mut self, tag: &Tag) -> bool {
        if tag.name != DIRECTIVE_TAG {
            return false;
        }
        let start = tag.span.start;
        let (segments, end) = if tag.self_closing {
            (vec![tag.clone()], tag.span.end)
        } else {
            let Some(offset) = self.src[tag.span.end..].find(DIRECTIVE_CLOSE) else {
                return false;
            };
            let inner_end = tag.span.end + offset;
            let nested = format!("<{DIRECTIVE_TAG}");
            if self.src[tag.span.end..inner_end].contains(&nested) {
                return false;
            }
            let segments = segment_tags(self.src, tag.span.end..inner_end);
            (segments, inner_end + DIRECTIVE_CLOSE.len())
        };

        self.flush_text(start);
        self.nodes.push(Node::Directive(Directive {
            open: tag.clone(),
            segments,
            span: start..end,
            line: line_of(self.src, start),
        }));
        self.pos = end;
        self.text_start = end;
        true
    }

    fn try_generated(&mut self, tag: &Tag) -> bool {
        if tag.name != CONTAINER_TAG || !tag.has(GENERATED_MARKER) || tag.self_closing {
            return false;
        }
        let Some(offset) = self.src[tag.span.end..].find(CONTAINER_CLOSE) else {
            return false;
        };
        let start = tag.span.start;
        let end = tag.span.end + offset + CONTAINER_CLOSE.len();

        self.flush_text(start);
        self.nodes.push(Node::Generated(start..end));
        self.pos = end;
        self.text_start = end;
        true
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            self.nodes.push(Node::Text(self.text_start..end));
        }
        self.text_start = end;
    }
}

fn segment_tags(src: &str, inner: Range<usize>) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut pos = inner.start;
    while let Some(offset) = src[pos..inner.end].find('<') {
        let at = pos + offset;
        match parse_tag(src, at) {
            Some(tag) if tag.name == SEGMENT_TAG && tag.span.end <= inner.end => {
                pos = tag.span.end;
                tags.push(tag);
            }
            _ => pos = at + 1,
        }
    }
    tags
}

/// 1-based line number of byte `offset`.
pub fn line_of(src: &str, offset: usize) -> usize {
    src[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"# Title

<GithubCodeSegment digest="">
  <CodeSegment
    path="https://github.com/o/r/blob/main/sub/file.py"
    lineStart={1}
    lineEnd={2}
    hosted={true}
  />
</GithubCodeSegment>

Trailing prose.
"#;

    #[test]
    fn finds_paired_directive() {
        let doc = Document::parse(PAGE);
        let directives: Vec<_> = doc.directives().collect();
        assert_eq!(directives.len(), 1);
        let d = directives[0];
        assert_eq!(d.line, 3);
        assert_eq!(d.digest(), "");
        assert!(doc.slice(&d.span).ends_with("</GithubCodeSegment>"));
        let refs = d.references().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].remote.path, "sub/file.py");
        assert!(refs[0].hosted);
    }

    #[test]
    fn nodes_cover_whole_source() {
        let doc = Document::parse(PAGE);
        let mut rebuilt = String::new();
        for node in &doc.nodes {
            let range = match node {
                Node::Text(r) | Node::Generated(r) => r.clone(),
                Node::Directive(d) => d.span.clone(),
            };
            rebuilt.push_str(doc.slice(&range));
        }
        assert_eq!(rebuilt, PAGE);
    }

    #[test]
    fn finds_self_closing_directive() {
        let src = r#"<GithubCodeSegment path="https://github.com/o/r/blob/main/a.rs" lineStart="1" lineEnd="1" />"#;
        let doc = Document::parse(src);
        let d = doc.directives().next().unwrap();
        assert_eq!(d.references().unwrap()[0].filename, "a.rs");
    }

    #[test]
    fn directive_without_segments_reports_no_segments() {
        let doc = Document::parse("<GithubCodeSegment digest=\"\">\n</GithubCodeSegment>");
        let d = doc.directives().next().unwrap();
        assert_eq!(d.references().unwrap_err(), DirectiveError::NoSegments);
    }

    #[test]
    fn recognises_generated_container() {
        let src = "<CodeGroup dynamic hasCopy>\n\t```py\n\tx\n\t```\n</CodeGroup>\nafter";
        let doc = Document::parse(src);
        assert!(matches!(doc.nodes[0], Node::Generated(ref r) if r.start == 0));
        assert_eq!(doc.nodes[1], Node::Text(src.len() - "\nafter".len()..src.len()));
    }

    #[test]
    fn hand_written_code_group_is_text() {
        let doc = Document::parse("<CodeGroup>\n</CodeGroup>");
        assert!(doc.nodes.iter().all(|n| matches!(n, Node::Text(_))));
    }

    #[test]
    fn directive_inside_fence_is_ignored() {
        let src = "```mdx\n<GithubCodeSegment digest=\"\">\n</GithubCodeSegment>\n```\n";
        let doc = Document::parse(src);
        assert_eq!(doc.directives().count(), 0);
    }

    const REAL_DIRECTIVE: &str = "<GithubCodeSegment digest=\"\">
  <CodeSegment path=\"https://github.com/o/r/blob/main/a.py\" lineStart={1} lineEnd={1} />
</GithubCodeSegment>
";

    #[test]
    fn directive_inside_code_span_is_ignored() {
        let src = format!("Wrap samples in a `<GithubCodeSegment>` element.\n\n{REAL_DIRECTIVE}");
        let doc = Document::parse(&src);
        let directives: Vec<_> = doc.directives().collect();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].line, 3);
        assert!(doc.slice(&directives[0].span).starts_with("<GithubCodeSegment digest"));
    }

    #[test]
    fn double_backtick_span_may_contain_single_backticks() {
        let src = format!("Use ``a ` <GithubCodeSegment> ` b`` here.\n\n{REAL_DIRECTIVE}");
        let doc = Document::parse(&src);
        let directives: Vec<_> = doc.directives().collect();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].line, 3);
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        let src = format!("A stray ` tick.\n\n{REAL_DIRECTIVE}");
        let doc = Document::parse(&src);
        assert_eq!(doc.directives().count(), 1);
    }

    #[test]
    fn bare_opening_tag_does_not_swallow_next_directive() {
        let src = format!("The <GithubCodeSegment> tag quotes code.\n\n{REAL_DIRECTIVE}");
        let doc = Document::parse(&src);
        let directives: Vec<_> = doc.directives().collect();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].line, 3);
        assert_eq!(directives[0].references().unwrap()[0].remote.path, "a.py");
    }

    #[test]
    fn unterminated_directive_is_text() {
        let doc = Document::parse("<GithubCodeSegment digest=\"\">\n<CodeSegment />");
        assert_eq!(doc.directives().count(), 0);
    }

    #[test]
    fn line_of_counts_newlines() {
        assert_eq!(line_of("a\nb\nc", 4), 3);
        assert_eq!(line_of("abc", 0), 1);
    }
}
