//! Login and registration flow.

use thiserror::Error;

use crate::error::ApiError;
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::model::User;
use crate::routes::Route;
use crate::session::Session;
use crate::traits::{AuthBackend, AuthResponse};
use crate::view_state::SubmitGate;

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Why a login or registration did not complete.
#[derive(Debug, Clone, Error)]
pub enum AuthFailure {
    /// Client-side validation failed; nothing was sent.
    #[error("{0}")]
    Invalid(FieldErrors),

    /// A submission is already in flight.
    #[error("a request is already in progress")]
    Busy,

    /// The server rejected the request or could not be reached.
    #[error("{message}")]
    Server { message: String, source: ApiError },
}

/// Drives the login/register screen against an [`AuthBackend`].
///
/// Forms are borrowed, so whatever the user typed survives a failure.
pub struct AuthFlow<'a, B: AuthBackend + ?Sized> {
    backend: &'a B,
    session: Session,
    gate: SubmitGate,
}

impl<'a, B: AuthBackend + ?Sized> AuthFlow<'a, B> {
    pub fn new(backend: &'a B, session: Session) -> Self {
        Self {
            backend,
            session,
            gate: SubmitGate::new(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.gate.is_busy()
    }

    /// On success the session holds the new token and the caller should
    /// navigate to the returned route.
    pub async fn login(&self, form: &LoginForm) -> Result<(User, Route), AuthFailure> {
        let _ticket = self.gate.try_begin().ok_or(AuthFailure::Busy)?;
        tracing::info!(user = %form.username_or_email, "logging in");
        let response = self
            .backend
            .login(form)
            .await
            .map_err(|e| server_failure(e, LOGIN_FAILED))?;
        Ok(self.accept(response))
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(User, Route), AuthFailure> {
        form.validate().map_err(AuthFailure::Invalid)?;
        let _ticket = self.gate.try_begin().ok_or(AuthFailure::Busy)?;
        tracing::info!(user = %form.username, "registering");
        let response = self
            .backend
            .register(form)
            .await
            .map_err(|e| server_failure(e, REGISTRATION_FAILED))?;
        Ok(self.accept(response))
    }

    fn accept(&self, response: AuthResponse) -> (User, Route) {
        self.session.establish(&response.access_token, &response.user);
        (response.user, Route::Dashboard)
    }
}

fn server_failure(source: ApiError, fallback: &str) -> AuthFailure {
    tracing::warn!("auth request failed: {source}");
    AuthFailure::Server {
        message: source.display_message(fallback),
        source,
    }
}

/// Fetch the profile, falling back to the cached user when the request
/// fails for any reason other than an expired session.
pub async fn current_user<B: AuthBackend + ?Sized>(
    backend: &B,
    session: &Session,
) -> Result<User, ApiError> {
    match backend.profile().await {
        Ok(user) => {
            session.set_user(&user);
            Ok(user)
        }
        Err(ApiError::Unauthenticated) => Err(ApiError::Unauthenticated),
        Err(e) => {
            tracing::warn!("profile fetch failed, using cached user: {e}");
            session.user().ok_or(e)
        }
    }
}
