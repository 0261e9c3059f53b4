//! Domain types for directives and the remote code they reference.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::DirectiveError;

/// Fixed number of `/`-separated segments before the in-repository path in a
/// `https://github.com/<owner>/<repo>/blob/<ref>/<path>` URL.
const REMOTE_PATH_OFFSET: usize = 7;

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// A single `name=value` pair from a tag's attribute list.
///
/// `span` is the byte range of the whole token (`name="value"`) in the
/// source document, used to restamp values in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub span: Range<usize>,
}

/// Look up an attribute value by name. The last occurrence wins.
pub fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .rev()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

// ---------------------------------------------------------------------------
// RemotePath
// ---------------------------------------------------------------------------

/// A file inside a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemotePath {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

impl RemotePath {
    /// Parse a blob URL such as
    /// `https://github.com/owner/repo/blob/main/sub/file.py`.
    pub fn parse(url: &str) -> Result<Self, DirectiveError> {
        let invalid = || DirectiveError::InvalidRemotePath(url.to_string());
        let parts: Vec<&str> = url.trim().split('/').collect();
        if parts.len() <= REMOTE_PATH_OFFSET {
            return Err(invalid());
        }
        let owner = parts[3];
        let repo = parts[4];
        let path = parts[REMOTE_PATH_OFFSET..].join("/");
        if owner.is_empty() || repo.is_empty() || path.is_empty() {
            return Err(invalid());
        }
        Ok(RemotePath {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path,
        })
    }

    /// Last segment of the in-repository path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.owner, self.repo, self.path)
    }
}

// ---------------------------------------------------------------------------
// LineRange
// ---------------------------------------------------------------------------

/// A 1-indexed, inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Select the lines of `content` covered by this range.
    ///
    /// Fails with [`DirectiveError::InvalidRange`] instead of truncating when
    /// the range is empty, starts at zero, or runs past the end of the file.
    pub fn select<'a>(&self, content: &'a str) -> Result<Vec<&'a str>, DirectiveError> {
        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines: Vec<&str> = body.split('\n').collect();
        if self.start == 0 || self.start > self.end || self.end > lines.len() {
            return Err(DirectiveError::InvalidRange {
                start: self.start,
                end: self.end,
                available: lines.len(),
            });
        }
        Ok(lines[self.start - 1..self.end].to_vec())
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}-L{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// SegmentReference
// ---------------------------------------------------------------------------

/// The remote file, line range and rendering options of one `<CodeSegment>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentReference {
    pub remote: RemotePath,
    pub lines: LineRange,
    pub filename: String,
    pub hosted: bool,
}

impl SegmentReference {
    /// Build a reference from a `<CodeSegment>` attribute list.
    pub fn from_attributes(attributes: &[Attribute]) -> Result<Self, DirectiveError> {
        let path = attribute(attributes, "path").ok_or(DirectiveError::MissingAttribute("path"))?;
        let remote = RemotePath::parse(path)?;
        let start = line_number(attributes, "lineStart")?;
        let end = line_number(attributes, "lineEnd")?;
        let filename = match attribute(attributes, "filename") {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => remote.file_name().to_string(),
        };
        let hosted = match attribute(attributes, "hosted") {
            None => false,
            Some(value) => parse_flag(value).ok_or_else(|| DirectiveError::InvalidAttribute {
                name: "hosted".to_string(),
                value: value.to_string(),
            })?,
        };

        Ok(SegmentReference {
            remote,
            lines: LineRange { start, end },
            filename,
            hosted,
        })
    }
}

fn line_number(attributes: &[Attribute], name: &'static str) -> Result<usize, DirectiveError> {
    let raw = attribute(attributes, name).ok_or(DirectiveError::MissingAttribute(name))?;
    raw.trim()
        .parse::<usize>()
        .map_err(|_| DirectiveError::InvalidAttribute {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> Attribute {
        Attribute {
            name: name.to_string(),
            value: value.to_string(),
            span: 0..0,
        }
    }

    #[test]
    fn remote_path_splits_owner_repo_and_file() {
        let remote =
            RemotePath::parse("https://github.com/fetchai/uAgents/blob/main/python/src/agent.py")
                .unwrap();
        assert_eq!(remote.owner, "fetchai");
        assert_eq!(remote.repo, "uAgents");
        assert_eq!(remote.path, "python/src/agent.py");
        assert_eq!(remote.file_name(), "agent.py");
    }

    #[test]
    fn remote_path_too_short_is_rejected() {
        let err = RemotePath::parse("https://github.com/owner/repo").unwrap_err();
        assert!(matches!(err, DirectiveError::InvalidRemotePath(_)));
    }

    #[test]
    fn select_inclusive_range() {
        let content = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10";
        let range = LineRange { start: 3, end: 5 };
        assert_eq!(range.select(content).unwrap(), vec!["3", "4", "5"]);
    }

    #[test]
    fn select_out_of_bounds_is_an_error() {
        let range = LineRange { start: 2, end: 4 };
        let err = range.select("a\nb\nc").unwrap_err();
        assert_eq!(
            err,
            DirectiveError::InvalidRange {
                start: 2,
                end: 4,
                available: 3
            }
        );
    }

    #[test]
    fn trailing_newline_does_not_add_a_line() {
        let content = "a\nb\nc\n";
        assert_eq!(
            LineRange { start: 3, end: 3 }.select(content).unwrap(),
            vec!["c"]
        );
        let err = LineRange { start: 3, end: 4 }.select(content).unwrap_err();
        assert_eq!(
            err,
            DirectiveError::InvalidRange {
                start: 3,
                end: 4,
                available: 3
            }
        );
    }

    #[test]
    fn select_zero_start_is_an_error() {
        let range = LineRange { start: 0, end: 1 };
        assert!(range.select("a").is_err());
    }

    #[test]
    fn reference_defaults_filename_and_hosted() {
        let reference = SegmentReference::from_attributes(&[
            attr("path", "https://github.com/o/r/blob/main/sub/file.py"),
            attr("lineStart", "1"),
            attr("lineEnd", "2"),
        ])
        .unwrap();
        assert_eq!(reference.filename, "file.py");
        assert!(!reference.hosted);
        assert_eq!(reference.lines, LineRange { start: 1, end: 2 });
    }

    #[test]
    fn reference_rejects_non_numeric_line() {
        let err = SegmentReference::from_attributes(&[
            attr("path", "https://github.com/o/r/blob/main/file.py"),
            attr("lineStart", "one"),
            attr("lineEnd", "2"),
        ])
        .unwrap_err();
        assert!(matches!(err, DirectiveError::InvalidAttribute { .. }));
    }

    #[test]
    fn reference_requires_path() {
        let err = SegmentReference::from_attributes(&[attr("lineStart", "1"), attr("lineEnd", "1")])
            .unwrap_err();
        assert_eq!(err, DirectiveError::MissingAttribute("path"));
    }
}
