use std::io::{self, IsTerminal};

use anyhow::anyhow;
use flashdeck_client::{HomePage, LoginForm, RegisterForm};

use crate::cli::{LoginArgs, OutputFormat, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_status;

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let password = match args.password {
        Some(password) => password,
        None => prompt_secret("Password: ")?,
    };
    let form = LoginForm::new(args.email, password);
    form.submit(&ctx.client).await?;
    println!("Logged in as {}", form.email.trim());
    Ok(())
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let password = match args.password {
        Some(password) => password,
        None => prompt_secret("Password: ")?,
    };
    let confirm_password = match args.confirm_password {
        Some(confirm) => confirm,
        None => prompt_secret("Confirm password: ")?,
    };
    let form = RegisterForm::new(args.email, password, confirm_password);
    let user = form.submit(&ctx.client).await?;
    println!(
        "Registered {} (id: {}); log in with `flashdeck login`",
        user.email, user.id
    );
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.client.logout().await?;
    println!("Logged out");
    Ok(())
}

pub(crate) async fn handle_status(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let landing = HomePage::new(ctx.client.auth().clone())
        .settled_landing()
        .await;
    render_status(landing, ctx.config.api_url.as_str(), format)
}

fn prompt_secret(prompt: &str) -> CliResult<String> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ));
    }
    rpassword::prompt_password(prompt)
        .map_err(|err| CliError::failure(anyhow!("failed to read password from stdin: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context_for;
    use flashdeck_client::Route;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn login_stores_token_and_navigates_home() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/auth/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("username=a%40b.com&password=pw");
            then.status(200)
                .json_body(json!({"access_token": "tok-a", "token_type": "bearer"}));
        });

        let ctx = context_for(&server, None).await;
        handle_login(
            &ctx,
            LoginArgs {
                email: "a@b.com".into(),
                password: Some("pw".into()),
            },
        )
        .await
        .expect("login should succeed");

        login.assert();
        assert_eq!(ctx.client.auth().token().as_deref(), Some("tok-a"));
        assert_eq!(ctx.client.navigator().current(), Route::Home);
    }

    #[tokio::test]
    async fn rejected_login_is_a_validation_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(400)
                .json_body(json!({"detail": "Incorrect email or password"}));
        });

        let ctx = context_for(&server, None).await;
        let err = handle_login(
            &ctx,
            LoginArgs {
                email: "a@b.com".into(),
                password: Some("nope".into()),
            },
        )
        .await
        .expect_err("login should fail");

        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "Incorrect email or password");
        assert!(ctx.client.auth().token().is_none());
    }

    #[tokio::test]
    async fn register_with_mismatched_confirmation_sends_nothing() {
        let server = MockServer::start_async().await;
        let register = server.mock(|when, then| {
            when.method(POST).path("/api/v1/users/");
            then.status(200);
        });

        let ctx = context_for(&server, None).await;
        let err = handle_register(
            &ctx,
            RegisterArgs {
                email: "a@b.com".into(),
                password: Some("pw".into()),
                confirm_password: Some("pw2".into()),
            },
        )
        .await
        .expect_err("mismatch should fail");

        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "Passwords do not match!");
        register.assert_calls(0);
    }

    #[tokio::test]
    async fn register_posts_json_and_navigates_to_login() {
        let server = MockServer::start_async().await;
        let register = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/users/")
                .json_body(json!({"email": "a@b.com", "password": "pw"}));
            then.status(200).json_body(json!({
                "id": 7,
                "email": "a@b.com",
                "is_active": true,
                "created_at": "2024-03-01T10:15:00"
            }));
        });

        let ctx = context_for(&server, None).await;
        handle_register(
            &ctx,
            RegisterArgs {
                email: "a@b.com".into(),
                password: Some("pw".into()),
                confirm_password: Some("pw".into()),
            },
        )
        .await
        .expect("register should succeed");

        register.assert();
        assert_eq!(ctx.client.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn logout_forgets_the_token() {
        let server = MockServer::start_async().await;
        let ctx = context_for(&server, Some("tok-a")).await;

        handle_status(&ctx, OutputFormat::Json)
            .await
            .expect("status should render");
        handle_logout(&ctx).await.expect("logout should succeed");

        assert!(!ctx.client.auth().is_authenticated());
        assert!(ctx.require_session().is_err());
    }
}
