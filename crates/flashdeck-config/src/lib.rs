#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Client configuration for Flashdeck.
//!
//! Layout: `defaults.rs` (constants and variable names), `loader.rs` (environment
//! overlay), `validate.rs` (parsers), `error.rs` (error type).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod validate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use flashdeck_telemetry::{DEFAULT_LOG_LEVEL, LogFormat};
use url::Url;

pub use error::{ConfigError, ConfigResult};
pub use validate::parse_api_url;

use crate::defaults::{
    DEFAULT_API_URL, DEFAULT_AUTOSAVE_DEBOUNCE_MS, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS,
    DEFAULT_TIMEOUT_SECS,
};

/// File name of the persisted session, derived from the fixed storage key.
pub const SESSION_FILE_NAME: &str = "auth-storage.json";

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API; always ends with `/`.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory holding the persisted session.
    pub session_dir: PathBuf,
    /// Page size for folder and set listings.
    pub page_size: u32,
    /// Debounce applied to library search input.
    pub search_debounce: Duration,
    /// Debounce applied to per-card autosave.
    pub autosave_debounce: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Defaults rooted at the given session directory.
    #[must_use]
    pub fn with_session_dir(session_dir: PathBuf) -> Self {
        Self {
            api_url: default_api_url(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_dir,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            autosave_debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Pretty,
        }
    }

    /// Location of the persisted session file.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        session_file_in(&self.session_dir)
    }
}

/// Session file path inside a directory.
#[must_use]
pub fn session_file_in(dir: &Path) -> PathBuf {
    dir.join(SESSION_FILE_NAME)
}

#[allow(clippy::expect_used)]
fn default_api_url() -> Url {
    parse_api_url(DEFAULT_API_URL).expect("default API URL is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::with_session_dir(PathBuf::from("/tmp/fd"));
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api/v1/");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.autosave_debounce, Duration::from_millis(1_500));
        assert_eq!(
            config.session_file(),
            PathBuf::from("/tmp/fd/auth-storage.json")
        );
    }
}
