//! Remote file access.
//!
//! [`SourceFetcher`] is the seam between the rewriter and the network.
//! [`GitHubFetcher`] implements it against the GitHub contents API:
//!
//! ```text
//! GET {api_root}/repos/{owner}/{repo}/contents/{path}?ref={git_ref}
//! Authorization: Bearer {token}
//! → { "content": "<base64>", "encoding": "base64", … }
//! ```
//!
//! [`CachingFetcher`] memoises results for the duration of a run so that
//! several directives quoting the same file cost one request.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use codesync_core::config::Credentials;
use codesync_core::types::RemotePath;

use crate::error::FetchError;

/// Source of remote file contents.
pub trait SourceFetcher {
    /// Return the full UTF-8 text of `remote`.
    fn fetch(&self, remote: &RemotePath) -> Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// GitHubFetcher
// ---------------------------------------------------------------------------

/// Blocking client for the GitHub contents API.
pub struct GitHubFetcher {
    agent: ureq::Agent,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubFetcher {
    /// Build a fetcher. Every request uses `credentials.timeout`.
    pub fn new(credentials: Credentials) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(credentials.timeout)
            .user_agent(concat!("codesync/", env!("CARGO_PKG_VERSION")))
            .build();
        GitHubFetcher { agent, credentials }
    }

    /// Contents endpoint for `remote`, without the query string.
    pub fn contents_url(&self, remote: &RemotePath) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.credentials.api_root, remote.owner, remote.repo, remote.path
        )
    }
}

impl SourceFetcher for GitHubFetcher {
    fn fetch(&self, remote: &RemotePath) -> Result<String, FetchError> {
        let url = self.contents_url(remote);
        tracing::debug!("GET {url}?ref={}", self.credentials.git_ref);

        let response = self
            .agent
            .get(&url)
            .query("ref", &self.credentials.git_ref)
            .set("Accept", "application/vnd.github.v3+json")
            .set("Authorization", &format!("Bearer {}", self.credentials.token))
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => FetchError::Status {
                    url: url.clone(),
                    status,
                },
                ureq::Error::Transport(transport) => FetchError::Transport {
                    url: url.clone(),
                    message: transport.to_string(),
                },
            })?;

        let body: ContentsResponse = response.into_json().map_err(|e| FetchError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(FetchError::Decode {
                    url,
                    message: format!("unsupported content encoding {encoding:?}"),
                });
            }
        }
        decode_content(&body.content).map_err(|message| FetchError::Decode { url, message })
    }
}

/// Decode the API's base64 `content` field, which is wrapped at 60 columns.
pub(crate) fn decode_content(content: &str) -> Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// CachingFetcher
// ---------------------------------------------------------------------------

/// Wraps a fetcher and remembers every result, failures included, keyed by
/// remote file.
pub struct CachingFetcher<F> {
    inner: F,
    cache: RefCell<HashMap<RemotePath, Result<String, FetchError>>>,
}

impl<F: SourceFetcher> CachingFetcher<F> {
    pub fn new(inner: F) -> Self {
        CachingFetcher {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl<F: SourceFetcher> SourceFetcher for CachingFetcher<F> {
    fn fetch(&self, remote: &RemotePath) -> Result<String, FetchError> {
        if let Some(hit) = self.cache.borrow().get(remote) {
            tracing::debug!("cache hit: {remote}");
            return hit.clone();
        }
        let result = self.inner.fetch(remote);
        self.cache.borrow_mut().insert(remote.clone(), result.clone());
        result
    }
}

// ---------------------------------------------------------------------------
// MemoryFetcher
// ---------------------------------------------------------------------------

/// In-memory fetcher keyed by `owner/repo/path`. Used for offline runs and
/// tests; counts calls so caching can be observed.
#[derive(Default)]
pub struct MemoryFetcher {
    files: HashMap<String, String>,
    calls: Cell<usize>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `content` for `owner/repo/path`.
    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.files.insert(key.into(), content.into());
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SourceFetcher for MemoryFetcher {
    fn fetch(&self, remote: &RemotePath) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        let key = format!("{}/{}/{}", remote.owner, remote.repo, remote.path);
        self.files
            .get(&key)
            .cloned()
            .ok_or(FetchError::NotFound(key))
    }
}

impl<T: SourceFetcher + ?Sized> SourceFetcher for &T {
    fn fetch(&self, remote: &RemotePath) -> Result<String, FetchError> {
        (**self).fetch(remote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
