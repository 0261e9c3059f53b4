//! codesync core library: directive model, tag tokenizer, configuration.
//!
//! - [`types`]: attributes, remote paths, line ranges, segment references
//! - [`tag`]: JSX-style tag tokenizer
//! - [`document`]: splits a page into text, directives and generated blocks
//! - [`config`]: YAML configuration and credential resolution
//! - [`error`]: [`ConfigError`], [`DirectiveError`]

pub mod config;
pub mod document;
pub mod error;
pub mod tag;
pub mod types;

pub use config::{Config, Credentials};
pub use document::{Directive, Document, Node};
pub use error::{ConfigError, DirectiveError};
pub use tag::Tag;
pub use types::{Attribute, LineRange, RemotePath, SegmentReference};
