//! Tool configuration.
//!
//! Loaded from an optional YAML file (`codesync.yaml` by default). Every
//! field has a default, so an empty or absent file is valid. The access
//! token never lives in the file; it is read once from the environment by
//! [`Config::credentials`] and handed to the fetcher at construction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "codesync.yaml";

/// Tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory walked when no target directory is given.
    pub docs_root: PathBuf,
    /// File extensions (without the dot) treated as documentation pages.
    pub extensions: Vec<String>,
    /// Base URL of the code-hosting API.
    pub api_root: String,
    /// Git ref passed as `?ref=` when fetching file contents.
    pub git_ref: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Prefix applied to every rendered code line.
    pub indent: String,
    /// Optional `.tera` file replacing the embedded container template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            docs_root: PathBuf::from("pages"),
            extensions: vec!["mdx".to_string(), "md".to_string()],
            api_root: "https://api.github.com".to_string(),
            git_ref: "main".to_string(),
            token_env: "ACCESS_TOKEN".to_string(),
            timeout_secs: 30,
            indent: "\t".to_string(),
            template: None,
        }
    }
}

/// Resolved settings for talking to the remote API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_root: String,
    pub git_ref: String,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_root", &self.api_root)
            .field("git_ref", &self.git_ref)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load config from `path`.
    ///
    /// Returns `ConfigError::Io` if unreadable, `ConfigError::Parse` (with
    /// path + line context) if malformed YAML or an unknown key is present.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `<dir>/codesync.yaml` if it exists,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            Config::load(&candidate)
        } else {
            Ok(Config::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "token_env",
                reason: "must name an environment variable".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `path` has one of the configured documentation extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Resolve credentials from the process environment.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_from(|var| std::env::var(var).ok())
    }

    /// Resolve credentials using `lookup` for environment access.
    pub fn credentials_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigError> {
        let token = lookup(&self.token_env)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingToken {
                var: self.token_env.clone(),
            })?;
        Ok(Credentials {
            api_root: self.api_root.trim_end_matches('/').to_string(),
            git_ref: self.git_ref.clone(),
            token,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
