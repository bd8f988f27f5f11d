//! API error taxonomy.
//!
//! Defined in `examdesk-core` so the view models can classify failures
//! (forced logout, admin-required redirect, not-found) without depending on
//! the HTTP client.

use thiserror::Error;

/// Errors that can occur when talking to the exam platform API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// A protected endpoint answered 401. The local session has been cleared.
    #[error("not logged in or session expired")]
    Unauthenticated,

    /// The endpoint answered 403.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// The endpoint answered 404.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success status.
    #[error(
        "API error (HTTP {status}){}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The owning view went away before the response arrived.
    #[error("request cancelled")]
    Cancelled,
}

/// Notice shown when an endpoint requires admin rights.
pub const ADMIN_REQUIRED: &str = "Admin access required";

impl ApiError {
    /// The message the server supplied in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            ApiError::Forbidden { message } | ApiError::NotFound { message } => Some(message),
            _ => None,
        }
    }

    /// Message suitable for an inline error or toast: the server's message
    /// when one was provided, otherwise `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// HTTP status associated with the error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthenticated => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
