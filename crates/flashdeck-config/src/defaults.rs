//! Default values for client configuration.
//!
//! # Design
//! - Keep every tunable in one place so the CLI help text and the loader agree.
//! - Durations are stored in milliseconds/seconds to match the environment variables.

/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Page size for folder and set listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Debounce applied to the library search box.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
/// Debounce applied to per-card autosave.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1_500;
/// Directory name created under the platform config dir for session state.
pub const SESSION_DIR_NAME: &str = "flashdeck";

/// Environment variable overriding the API URL.
pub const ENV_API_URL: &str = "FLASHDECK_API_URL";
/// Environment variable overriding the request timeout (seconds).
pub const ENV_TIMEOUT_SECS: &str = "FLASHDECK_HTTP_TIMEOUT_SECS";
/// Environment variable overriding the session directory.
pub const ENV_SESSION_DIR: &str = "FLASHDECK_SESSION_DIR";
/// Environment variable overriding the page size.
pub const ENV_PAGE_SIZE: &str = "FLASHDECK_PAGE_SIZE";
/// Environment variable overriding the search debounce (milliseconds).
pub const ENV_SEARCH_DEBOUNCE_MS: &str = "FLASHDECK_SEARCH_DEBOUNCE_MS";
/// Environment variable overriding the autosave debounce (milliseconds).
pub const ENV_AUTOSAVE_MS: &str = "FLASHDECK_AUTOSAVE_MS";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "FLASHDECK_LOG_LEVEL";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "FLASHDECK_LOG_FORMAT";
