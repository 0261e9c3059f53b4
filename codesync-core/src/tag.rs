//! Tokenizer for JSX-style tags in MDX documents.
//!
//! Only the small subset of JSX that directives use is understood: a tag
//! name followed by attributes whose values are double-quoted, single-quoted,
//! a brace expression, or absent (bare boolean attribute).

use std::ops::Range;

use crate::types::Attribute;

/// A parsed opening (or self-closing) tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    /// Byte range of the whole tag, `<` through `>`.
    pub span: Range<usize>,
}

impl Tag {
    /// Look up an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        crate::types::attribute(&self.attributes, name)
    }

    /// Whether an attribute with this name is present at all.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

/// Parse the tag starting at byte `start` of `src` (which must point at `<`).
///
/// Returns `None` for closing tags, comments, unterminated tags, and anything
/// else that is not a well-formed opening tag.
pub fn parse_tag(src: &str, start: usize) -> Option<Tag> {
    let bytes = src.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }
    let mut pos = start + 1;
    if !bytes.get(pos)?.is_ascii_alphabetic() {
        return None;
    }
    let name_start = pos;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    let name = src[name_start..pos].to_string();

    let mut attributes = Vec::new();
    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos)? {
            b'>' => {
                return Some(Tag {
                    name,
                    attributes,
                    self_closing: false,
                    span: start..pos + 1,
                });
            }
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    return Some(Tag {
                        name,
                        attributes,
                        self_closing: true,
                        span: start..pos + 2,
                    });
                }
                return None;
            }
            _ => {
                let (attribute, next) = parse_attribute(src, pos)?;
                attributes.push(attribute);
                pos = next;
            }
        }
    }
}

fn parse_attribute(src: &str, start: usize) -> Option<(Attribute, usize)> {
    let bytes = src.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == start {
        return None;
    }
    let name = src[start..pos].to_string();

    let after_name = skip_whitespace(bytes, pos);
    if bytes.get(after_name) != Some(&b'=') {
        // Bare boolean attribute.
        let attribute = Attribute {
            name,
            value: "true".to_string(),
            span: start..pos,
        };
        return Some((attribute, pos));
    }

    let value_start = skip_whitespace(bytes, after_name + 1);
    let (value, end) = match bytes.get(value_start)? {
        quote @ (b'"' | b'\'') => {
            let close = find_byte(bytes, value_start + 1, *quote)?;
            (src[value_start + 1..close].to_string(), close + 1)
        }
        b'{' => {
            let close = matching_brace(bytes, value_start)?;
            let inner = src[value_start + 1..close].trim();
            (unquote(inner).to_string(), close + 1)
        }
        _ => {
            let mut end = value_start;
            while end < bytes.len()
                && !bytes[end].is_ascii_whitespace()
                && bytes[end] != b'>'
                && !(bytes[end] == b'/' && bytes.get(end + 1) == Some(&b'>'))
            {
                end += 1;
            }
            (src[value_start..end].to_string(), end)
        }
    };

    let attribute = Attribute {
        name,
        value,
        span: start..end,
    };
    Some((attribute, end))
}

/// Index of the `}` closing the `{` at `open`, skipping quoted strings.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = open;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                pos = find_byte(bytes, pos + 1, quote)?;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

fn unquote(inner: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            return &inner[1..inner.len() - 1];
        }
    }
    inner
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|b| *b == needle)
        .map(|offset| from + offset)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
}

/// Return `tag_src` (the exact text of an opening tag) with attribute `name`
/// set to `value`, written as `name="value"`.
///
/// An existing attribute is replaced in place; otherwise the attribute is
/// inserted directly after the tag name. Everything else, including line
/// breaks inside the tag, is preserved.
pub fn set_attribute(tag_src: &str, name: &str, value: &str) -> String {
    let rendered = format!("{name}=\"{value}\"");
    let Some(tag) = parse_tag(tag_src, 0) else {
        return tag_src.to_string();
    };
    if let Some(existing) = tag.attributes.iter().rev().find(|a| a.name == name) {
        let mut out = String::with_capacity(tag_src.len() + value.len());
        out.push_str(&tag_src[..existing.span.start]);
        out.push_str(&rendered);
        out.push_str(&tag_src[existing.span.end..]);
        return out;
    }
    let name_end = 1 + tag.name.len();
    format!("{} {}{}", &tag_src[..name_end], rendered, &tag_src[name_end..])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_brace_and_bare_values() {
        let src = r#"<CodeSegment path="a/b" lineStart={3} filename='x.py' hosted />"#;
        let tag = parse_tag(src, 0).unwrap();
        assert_eq!(tag.name, "CodeSegment");
        assert!(tag.self_closing);
        assert_eq!(tag.get("path"), Some("a/b"));
        assert_eq!(tag.get("lineStart"), Some("3"));
        assert_eq!(tag.get("filename"), Some("x.py"));
        assert_eq!(tag.get("hosted"), Some("true"));
        assert_eq!(tag.span, 0..src.len());
    }

    #[test]
    fn brace_value_with_quoted_string_is_unquoted() {
        let tag = parse_tag(r#"<A path={"x}y"}>"#, 0).unwrap();
        assert_eq!(tag.get("path"), Some("x}y"));
        assert!(!tag.self_closing);
    }

    #[test]
    fn multiline_tag_is_parsed() {
        let src = "<GithubCodeSegment\n  digest=\"\"\n>";
        let tag = parse_tag(src, 0).unwrap();
        assert_eq!(tag.get("digest"), Some(""));
        assert_eq!(tag.span.end, src.len());
    }

    #[test]
    fn closing_tags_and_garbage_are_rejected() {
        assert!(parse_tag("</CodeGroup>", 0).is_none());
        assert!(parse_tag("< notatag", 0).is_none());
        assert!(parse_tag("<A path=\"unterminated", 0).is_none());
        assert!(parse_tag("<!-- comment -->", 0).is_none());
    }

    #[test]
    fn attribute_spans_cover_name_and_value() {
        let src = r#"<A digest="abc" x={1}>"#;
        let tag = parse_tag(src, 0).unwrap();
        assert_eq!(&src[tag.attributes[0].span.clone()], r#"digest="abc""#);
        assert_eq!(&src[tag.attributes[1].span.clone()], "x={1}");
    }

    #[test]
    fn set_attribute_replaces_existing_value() {
        let out = set_attribute(r#"<GithubCodeSegment digest="old">"#, "digest", "new");
        assert_eq!(out, r#"<GithubCodeSegment digest="new">"#);
    }

    #[test]
    fn set_attribute_inserts_after_name() {
        let out = set_attribute("<GithubCodeSegment\n  path=\"p\" />", "digest", "d");
        assert_eq!(out, "<GithubCodeSegment digest=\"d\"\n  path=\"p\" />");
    }

    #[test]
    fn set_attribute_normalises_quote_style() {
        let out = set_attribute("<G digest={''}>", "digest", "");
        assert_eq!(out, r#"<G digest="">"#);
    }
}
