//! Application context, error types, and exit codes shared by command handlers.

use std::fmt::{self, Display, Formatter};

use flashdeck_api_models::Id;
use flashdeck_client::{
    ApiClient, ApiError, AuthStore, EditorError, EditorPage, FormError, LibraryError,
    LibraryPage, Navigator,
};
use flashdeck_config::ClientConfig;

/// Message shown when a command needs a session and none is stored.
pub(crate) const LOGIN_REQUIRED: &str = "not logged in; run `flashdeck login` first";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Statuses the server uses for rejected input.
const fn is_validation_status(status: u16) -> bool {
    matches!(status, 400 | 409 | 422)
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err.status() {
            Some(status) if is_validation_status(status) => Self::validation(err.user_message()),
            _ if matches!(err, ApiError::RefreshFailed { .. }) => {
                Self::validation(err.user_message())
            }
            _ => Self::failure(err),
        }
    }
}

impl From<FormError> for CliError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Api(api) => api.into(),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<LibraryError> for CliError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Form(form) => form.into(),
            LibraryError::Api(api) => api.into(),
            other @ (LibraryError::FolderNotEmpty { .. } | LibraryError::NoFolderSelected) => {
                Self::validation(other.to_string())
            }
        }
    }
}

impl From<EditorError> for CliError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::LoginRequired => Self::validation(LOGIN_REQUIRED),
            EditorError::Form(form) => form.into(),
            EditorError::Api(api) => api.into(),
            load @ EditorError::Load { .. } => Self::failure(load),
            other @ (EditorError::UnknownCard(_) | EditorError::InvalidMove { .. }) => {
                Self::validation(other.to_string())
            }
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: ApiClient,
    pub(crate) config: ClientConfig,
}

impl AppContext {
    /// Restore the persisted session and build the API client.
    pub(crate) async fn connect(config: ClientConfig) -> CliResult<Self> {
        let auth = AuthStore::file_backed(config.session_file());
        auth.hydrate().await;
        let client = ApiClient::from_config(&config, auth, Navigator::default())
            .map_err(CliError::failure)?;
        Ok(Self { client, config })
    }

    /// Fail fast when no token is stored.
    pub(crate) fn require_session(&self) -> CliResult<()> {
        if self.client.auth().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::validation(LOGIN_REQUIRED))
        }
    }

    pub(crate) fn library(&self) -> LibraryPage {
        LibraryPage::from_config(self.client.clone(), &self.config)
    }

    pub(crate) async fn editor(&self, set_id: Id) -> CliResult<EditorPage> {
        Ok(EditorPage::open_with_config(self.client.clone(), set_id, &self.config).await?)
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<url::Url, String> {
    flashdeck_config::parse_api_url(input).map_err(|err| err.to_string())
}
