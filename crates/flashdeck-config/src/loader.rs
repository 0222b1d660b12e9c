//! Environment-driven configuration loading.
//!
//! # Design
//! - Start from defaults, then overlay `FLASHDECK_*` variables.
//! - Read variables through a lookup closure so tests never touch process state.

use std::path::PathBuf;
use std::time::Duration;

use flashdeck_telemetry::LogFormat;

use crate::ClientConfig;
use crate::defaults::{
    ENV_API_URL, ENV_AUTOSAVE_MS, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PAGE_SIZE,
    ENV_SEARCH_DEBOUNCE_MS, ENV_SESSION_DIR, ENV_TIMEOUT_SECS, SESSION_DIR_NAME,
};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{parse_api_url, parse_positive_u32, parse_positive_u64};

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is present but invalid, or when no
    /// session directory can be derived.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_dir = match non_empty(&lookup, ENV_SESSION_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_session_dir()?,
        };
        let mut config = Self::with_session_dir(session_dir);

        if let Some(raw) = non_empty(&lookup, ENV_API_URL) {
            config.api_url = parse_api_url(&raw)?;
        }
        if let Some(raw) = non_empty(&lookup, ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_positive_u64(ENV_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = non_empty(&lookup, ENV_PAGE_SIZE) {
            config.page_size = parse_positive_u32(ENV_PAGE_SIZE, &raw)?;
        }
        if let Some(raw) = non_empty(&lookup, ENV_SEARCH_DEBOUNCE_MS) {
            config.search_debounce =
                Duration::from_millis(parse_positive_u64(ENV_SEARCH_DEBOUNCE_MS, &raw)?);
        }
        if let Some(raw) = non_empty(&lookup, ENV_AUTOSAVE_MS) {
            config.autosave_debounce =
                Duration::from_millis(parse_positive_u64(ENV_AUTOSAVE_MS, &raw)?);
        }
        if let Some(raw) = non_empty(&lookup, ENV_LOG_LEVEL) {
            config.log_level = raw;
        }
        if let Some(raw) = non_empty(&lookup, ENV_LOG_FORMAT) {
            config.log_format =
                raw.parse::<LogFormat>()
                    .map_err(|reason| ConfigError::InvalidField {
                        field: ENV_LOG_FORMAT,
                        value: raw.clone(),
                        reason,
                    })?;
        }

        tracing::debug!(api_url = %config.api_url, session_dir = %config.session_dir.display(), "configuration loaded");
        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn default_session_dir() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(SESSION_DIR_NAME))
        .ok_or(ConfigError::SessionDirUnavailable)
}
