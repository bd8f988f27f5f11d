//! `examdesk login | register | logout | whoami`.

use std::path::Path;

use anyhow::Result;

use examdesk_core::auth::{current_user, AuthFailure, AuthFlow};
use examdesk_core::forms::{LoginForm, RegisterForm};
use examdesk_core::routes::{self, Route, RouteDecision};

use super::App;

pub async fn login(config: Option<&Path>, user: String, password: String) -> Result<()> {
    let app = App::load(config)?;
    if let RouteDecision::Redirect(_) = routes::resolve(Route::Login, &app.session) {
        let name = app
            .session
            .user()
            .map(|u| u.username)
            .unwrap_or_else(|| "an existing user".to_string());
        println!("Already logged in as {name}. Run `examdesk logout` to switch accounts.");
        return Ok(());
    }

    let form = LoginForm {
        username_or_email: user,
        password,
    };
    let (user, _) = AuthFlow::new(&app.api, app.session.clone())
        .login(&form)
        .await
        .map_err(describe)?;
    println!("Logged in as {}", user.username);
    Ok(())
}

pub async fn register(
    config: Option<&Path>,
    username: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<()> {
    let app = App::load(config)?;
    let form = RegisterForm {
        username,
        email,
        password,
        confirm_password,
    };
    let (user, _) = AuthFlow::new(&app.api, app.session.clone())
        .register(&form)
        .await
        .map_err(describe)?;
    println!("Registered and logged in as {}", user.username);
    Ok(())
}

pub fn logout(config: Option<&Path>) -> Result<()> {
    let app = App::load(config)?;
    let was_logged_in = app.session.is_authenticated();
    routes::logout(&app.session);
    if was_logged_in {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub async fn whoami(config: Option<&Path>) -> Result<()> {
    let app = App::for_route(config, Route::Dashboard)?;
    let user = current_user(&app.api, &app.session).await?;
    let role = if user.is_admin { "admin" } else { "learner" };
    println!("{} <{}> ({role})", user.username, user.email);
    tracing::debug!(api = %app.config.api_url, "profile resolved");
    Ok(())
}

fn describe(failure: AuthFailure) -> anyhow::Error {
    match failure {
        AuthFailure::Invalid(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, msg)| format!("  {field}: {msg}"))
                .collect();
            anyhow::anyhow!("invalid input:\n{}", lines.join("\n"))
        }
        other => other.into(),
    }
}
