use flashdeck_api_models::{Token, User, UserCreate};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::http::{ApiClient, ApiRequest};

impl ApiClient {
    /// Exchange credentials for a token and store it in the auth store.
    ///
    /// The server also sets the refresh cookie; it is persisted with the token.
    ///
    /// # Errors
    ///
    /// Rejected credentials surface as a `401` [`ApiError::Status`]; a token that
    /// cannot be persisted surfaces as [`ApiError::Session`].
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Token> {
        let request = ApiRequest::post("auth/login")
            .form(&[("username", email), ("password", password)])
            .without_refresh();
        let token: Token = self.fetch_json(request).await?;
        self.auth()
            .set_token(token.access_token.clone())
            .await
            .map_err(|err| {
                warn!(error = %err, "failed to persist token after login");
                ApiError::Session {
                    message: err.to_string(),
                }
            })?;
        info!("logged in");
        Ok(token)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Server-side validation failures (duplicate email) surface as [`ApiError::Status`].
    pub async fn register(&self, email: &str, password: &str) -> ApiResult<User> {
        let payload = UserCreate {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = ApiRequest::post("users/")
            .json(&payload)?
            .without_refresh();
        self.fetch_json(request).await
    }

    /// Renew the access token through the refresh cookie and store it.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the refresh endpoint, or [`ApiError::Session`].
    pub async fn refresh(&self) -> ApiResult<Token> {
        let token = self.request_refresh().await?;
        self.auth()
            .set_token(token.access_token.clone())
            .await
            .map_err(|err| ApiError::Session {
                message: err.to_string(),
            })?;
        Ok(token)
    }

    /// Clear the stored session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Session`] when persisted state cannot be removed.
    pub async fn logout(&self) -> ApiResult<()> {
        self.auth()
            .logout()
            .await
            .map_err(|err| ApiError::Session {
                message: err.to_string(),
            })
    }
}
