//! Domain model, validation, and view models for the examdesk client.
//!
//! This crate holds everything about the exam platform that does not need a
//! network connection: the wire data model, option lettering, form and
//! bulk-question validation, presentation helpers, the session context, and
//! the view models that orchestrate calls through the backend traits.

pub mod admin;
pub mod auth;
pub mod cancel;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod grading;
pub mod lettering;
pub mod model;
pub mod presentation;
pub mod questions;
pub mod review;
pub mod routes;
pub mod session;
pub mod traits;
pub mod view_state;

pub use error::ApiError;
pub use session::{MemorySessionStore, Session, SessionStore};
