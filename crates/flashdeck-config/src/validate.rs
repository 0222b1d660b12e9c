//! Parsing and validation helpers for configuration values.

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Parse an absolute http(s) API URL, normalising it to end with `/`.
///
/// The trailing slash matters: relative joins such as `folders/` must extend the
/// base path instead of replacing its last segment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for unparsable input and
/// [`ConfigError::UnsupportedScheme`] for non-http(s) schemes.
pub fn parse_api_url(raw: &str) -> ConfigResult<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidField {
        field: "api_url",
        value: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            value: trimmed.to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn parse_positive_u64(field: &'static str, raw: &str) -> ConfigResult<u64> {
    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidField {
            field,
            value: raw.to_string(),
            reason: err.to_string(),
        })?;
    ensure_positive(field, value)
}

pub(crate) fn parse_positive_u32(field: &'static str, raw: &str) -> ConfigResult<u32> {
    let value = parse_positive_u64(field, raw)?;
    u32::try_from(value).map_err(|err| ConfigError::InvalidField {
        field,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) const fn ensure_positive(field: &'static str, value: u64) -> ConfigResult<u64> {
    if value == 0 {
        Err(ConfigError::MustBePositive { field })
    } else {
        Ok(value)
    }
}
