//! Form state for login, registration, and set dialogs.
//!
//! # Design
//! - Keep inputs as typed strings; trim and convert only on submit.
//! - Validation failures block submission and carry the inline message.

use flashdeck_api_models::{CardSet, SetPayload, Token, User, split_tags};
use thiserror::Error;
use tracing::info;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::navigation::Route;

/// Validation or submission failure of a form.
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    /// A required field was blank.
    #[error("{field} is required")]
    Required {
        /// Field label.
        field: &'static str,
    },
    /// The email address is malformed.
    #[error("enter a valid email address")]
    InvalidEmail,
    /// Password and confirmation differ.
    #[error("Passwords do not match!")]
    PasswordMismatch,
    /// The server rejected the submission.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
}

/// Trimmed value of a required field.
///
/// # Errors
///
/// [`FormError::Required`] when the value is blank.
pub fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Required { field });
    }
    Ok(value.to_string())
}

fn checked_email(value: &str) -> Result<String, FormError> {
    let email = required("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(FormError::InvalidEmail),
    }
}

fn checked_password(value: &str) -> Result<(), FormError> {
    if value.is_empty() {
        return Err(FormError::Required { field: "password" });
    }
    Ok(())
}

/// Login form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email address.
    pub email: String,
    /// Password, sent as typed.
    pub password: String,
}

impl LoginForm {
    /// Form pre-filled with credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the inputs without contacting the server.
    ///
    /// # Errors
    ///
    /// The first failing field.
    pub fn validate(&self) -> Result<(), FormError> {
        checked_email(&self.email)?;
        checked_password(&self.password)
    }

    /// Validate, log in, and navigate home.
    ///
    /// # Errors
    ///
    /// Validation failures, or [`FormError::Api`] when the server rejects the login.
    pub async fn submit(&self, client: &ApiClient) -> Result<Token, FormError> {
        self.validate()?;
        let email = self.email.trim();
        let token = client.login(email, &self.password).await?;
        client.navigator().navigate(Route::Home);
        Ok(token)
    }
}

/// Registration form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

impl RegisterForm {
    /// Form pre-filled with inputs.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check the inputs without contacting the server.
    ///
    /// # Errors
    ///
    /// The first failing field, or [`FormError::PasswordMismatch`].
    pub fn validate(&self) -> Result<(), FormError> {
        checked_email(&self.email)?;
        checked_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(())
    }

    /// Validate, register, and navigate to the login form.
    ///
    /// # Errors
    ///
    /// Validation failures, or [`FormError::Api`] when the server refuses the account.
    pub async fn submit(&self, client: &ApiClient) -> Result<User, FormError> {
        self.validate()?;
        let user = client.register(self.email.trim(), &self.password).await?;
        info!(user_id = user.id, "account registered");
        client.navigator().navigate(Route::Login);
        Ok(user)
    }
}

/// Fields of the create/edit set dialog; tags are a comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDraft {
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Visibility flag.
    pub is_public: bool,
    /// Comma-separated tag names.
    pub tags: String,
}

impl SetDraft {
    /// Trimmed request payload.
    ///
    /// # Errors
    ///
    /// [`FormError::Required`] when the name is blank.
    pub fn to_payload(&self) -> Result<SetPayload, FormError> {
        Ok(SetPayload {
            name: required("name", &self.name)?,
            description: Some(self.description.trim().to_string()),
            is_public: self.is_public,
            tags: split_tags(&self.tags),
        })
    }
}

impl From<&CardSet> for SetDraft {
    fn from(set: &CardSet) -> Self {
        Self {
            name: set.name.clone(),
            description: set.description.clone().unwrap_or_default(),
            is_public: set.is_public,
            tags: set.tags_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client_for;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn register_requires_matching_passwords() {
        let form = RegisterForm::new("a@b.com", "secret", "secret2");
        let err = form.validate().expect_err("mismatch");
        assert_eq!(err, FormError::PasswordMismatch);
        assert_eq!(err.to_string(), "Passwords do not match!");
        assert!(RegisterForm::new("a@b.com", "secret", "secret").validate().is_ok());
    }

    #[test]
    fn login_requires_both_fields() {
        assert_eq!(
            LoginForm::new("  ", "pw").validate(),
            Err(FormError::Required { field: "email" })
        );
        assert_eq!(
            LoginForm::new("a@b.com", "").validate(),
            Err(FormError::Required { field: "password" })
        );
        assert_eq!(
            LoginForm::new("nobody", "pw").validate(),
            Err(FormError::InvalidEmail)
        );
    }

    #[test]
    fn set_draft_trims_and_splits_tags() {
        let draft = SetDraft {
            name: "  Verbs ".into(),
            description: " irregular ".into(),
            is_public: true,
            tags: "spanish, , verbs".into(),
        };
        let payload = draft.to_payload().expect("valid");
        assert_eq!(payload.name, "Verbs");
        assert_eq!(payload.description.as_deref(), Some("irregular"));
        assert_eq!(payload.tags, vec!["spanish", "verbs"]);
        assert_eq!(
            SetDraft::default().to_payload(),
            Err(FormError::Required { field: "name" })
        );
    }

    #[tokio::test]
    async fn invalid_register_form_never_reaches_server() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/users/");
            then.status(200);
        });
        let client = client_for(&server, None).await;

        let err = RegisterForm::new("a@b.com", "pw", "other")
            .submit(&client)
            .await
            .expect_err("blocked");
        assert_eq!(err, FormError::PasswordMismatch);
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn successful_submissions_navigate() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/users/");
            then.status(200)
                .json_body(json!({"id": 1, "email": "a@b.com", "is_active": true}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(200).json_body(json!({"access_token": "tok"}));
        });
        let client = client_for(&server, None).await;

        RegisterForm::new("a@b.com", "pw", "pw")
            .submit(&client)
            .await
            .expect("registered");
        assert_eq!(client.navigator().current(), Route::Login);

        LoginForm::new("a@b.com", "pw")
            .submit(&client)
            .await
            .expect("logged in");
        assert_eq!(client.navigator().current(), Route::Home);
        assert_eq!(client.auth().token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn rejected_login_shows_server_detail() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(401)
                .json_body(json!({"detail": "Incorrect email or password"}));
        });
        let client = client_for(&server, None).await;

        let err = LoginForm::new("a@b.com", "bad")
            .submit(&client)
            .await
            .expect_err("rejected");
        assert_eq!(err.to_string(), "Incorrect email or password");
        assert_eq!(client.navigator().current(), Route::Home);
        assert!(!client.auth().is_authenticated());
    }
}
