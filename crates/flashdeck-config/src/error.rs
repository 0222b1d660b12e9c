//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be parsed.
    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidField {
        /// Field or environment variable that failed.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Short description of the failure.
        reason: String,
    },
    /// The API URL is not an absolute http(s) URL.
    #[error("api url must use http or https: '{value}'")]
    UnsupportedScheme {
        /// Offending URL.
        value: String,
    },
    /// A numeric setting must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive {
        /// Field that was zero.
        field: &'static str,
    },
    /// No session directory could be derived.
    #[error("unable to determine a session directory; set FLASHDECK_SESSION_DIR")]
    SessionDirUnavailable,
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
