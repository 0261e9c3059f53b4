//! Error types for codesync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or resolving credentials.
///
/// Every variant is fatal: the CLI aborts before any document is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The bearer token environment variable is unset or empty.
    #[error("environment variable {var} is not set; it must hold the API access token")]
    MissingToken { var: String },

    /// A config value is present but unusable.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Per-directive errors. None of these abort a run; the directive is skipped
/// and the error is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// The directive has no `<CodeSegment>` reference to render.
    #[error("directive has no segment reference")]
    NoSegments,

    /// A required attribute is absent.
    #[error("missing attribute `{0}`")]
    MissingAttribute(&'static str),

    /// An attribute value could not be interpreted.
    #[error("attribute `{name}` has invalid value {value:?}")]
    InvalidAttribute { name: String, value: String },

    /// The remote path does not name owner, repository and file.
    #[error("remote path {0:?} does not look like https://github.com/<owner>/<repo>/blob/<ref>/<file>")]
    InvalidRemotePath(String),

    /// Line range is malformed or outside the fetched file.
    #[error("invalid line range {start}..={end} for a file of {available} line(s)")]
    InvalidRange {
        start: usize,
        end: usize,
        available: usize,
    },
}
