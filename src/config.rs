use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Default embedding dimension (§3 "vector").
pub const DEFAULT_DIMENSION: usize = 1536;

/// JSON-backed configuration (§6 "Configuration (collaborator)", §10.3).
///
/// Loading never fails: a missing or unparseable file yields
/// [`Config::default`] so the indexer stays usable without any
/// collaborator-provided configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for the embedding provider. Empty string selects the
    /// deterministic mock client instead of the HTTP client.
    pub embedding_api_key: String,
    /// Embedding dimension override.
    pub dimension: usize,
    /// Cache directory override, subject to `~` expansion.
    pub cache_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_api_key: String::new(),
            dimension: DEFAULT_DIMENSION,
            cache_dir: "~/.cache/codechat/".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to [`Config::default`] on any I/O or
    /// parse failure (missing file is the expected common case, not an
    /// error condition).
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => match serde_json::from_reader(file) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Config::load: failed to parse, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                warn!(path = %path.display(), "Config::load: no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolved cache directory with `~` expanded to the user's home.
    pub fn cache_dir_path(&self) -> PathBuf {
        expand_tilde(&self.cache_dir)
    }
}

/// Expand a leading `~` to the `HOME` environment variable. Mirrors the
/// corpus's hand-rolled helper rather than pulling in a dedicated crate
/// for a single substitution.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
