//! Error types for REST calls.

use thiserror::Error;

/// Failure of a single API operation.
///
/// The type is `Clone` so one refresh failure can be delivered to every request
/// that was queued behind it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild {
        /// Builder message.
        message: String,
    },
    /// The request path could not be joined onto the base URL.
    #[error("invalid request path '{path}': {message}")]
    InvalidPath {
        /// Relative path that failed.
        path: String,
        /// Parser message.
        message: String,
    },
    /// The request body could not be encoded.
    #[error("failed to encode request body for {path}: {message}")]
    Encode {
        /// Relative path of the request.
        path: String,
        /// Encoder message.
        message: String,
    },
    /// The request never produced an HTTP response.
    #[error("request to {path} failed: {message}")]
    Transport {
        /// Relative path of the request.
        path: String,
        /// Transport message.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("{path} returned status {status}{}", detail_suffix(.detail.as_deref()))]
    Status {
        /// Relative path of the request.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, when present.
        detail: Option<String>,
    },
    /// A success response body did not match the expected shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode {
        /// Relative path of the request.
        path: String,
        /// Decoder message.
        message: String,
    },
    /// Refreshing the access token failed; the session has been cleared.
    #[error("session refresh failed: {cause}")]
    RefreshFailed {
        /// Error returned by the refresh call.
        cause: Box<ApiError>,
    },
    /// The refresh coordinator went away before replaying the request.
    #[error("request for {path} was dropped while waiting for a token refresh")]
    ReplayDropped {
        /// Relative path of the request.
        path: String,
    },
    /// Persisting session state failed.
    #[error("failed to persist session: {message}")]
    Session {
        /// Storage message.
        message: String,
    },
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map_or_else(String::new, |detail| format!(": {detail}"))
}

impl ApiError {
    /// HTTP status code, when the failure came from a server response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RefreshFailed { cause } => cause.status(),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Short message suitable for showing to a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Status { status, .. } => format!("request failed with status {status}"),
            Self::RefreshFailed { .. } => "your session has expired; please log in again".into(),
            other => other.to_string(),
        }
    }
}

/// Convenience alias for API results.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_detail_when_present() {
        let with_detail = ApiError::Status {
            path: "folders/3".into(),
            status: 404,
            detail: Some("Folder not found".into()),
        };
        assert_eq!(
            with_detail.to_string(),
            "folders/3 returned status 404: Folder not found"
        );
        assert_eq!(with_detail.user_message(), "Folder not found");

        let bare = ApiError::Status {
            path: "folders/3".into(),
            status: 500,
            detail: None,
        };
        assert_eq!(bare.to_string(), "folders/3 returned status 500");
        assert_eq!(bare.user_message(), "request failed with status 500");
    }

    #[test]
    fn refresh_failure_reports_inner_status() {
        let err = ApiError::RefreshFailed {
            cause: Box::new(ApiError::Status {
                path: "auth/refresh".into(),
                status: 401,
                detail: None,
            }),
        };
        assert!(err.is_unauthorized());
        assert_eq!(
            err.user_message(),
            "your session has expired; please log in again"
        );
        assert_eq!(
            ApiError::Transport {
                path: "cards/1".into(),
                message: "timeout".into()
            }
            .status(),
            None
        );
    }
}
