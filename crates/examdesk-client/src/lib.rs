//! HTTP client, session storage, and configuration for examdesk.
//!
//! [`ApiClient`] implements the `examdesk-core` backend traits over the
//! platform's REST API. [`MockBackend`] implements the same traits in memory
//! for tests and offline demos.

pub mod config;
pub mod http;
pub mod mock;
pub mod store;

pub use config::{load_config, load_config_from, ExamdeskConfig};
pub use http::ApiClient;
pub use mock::MockBackend;
pub use store::FileSessionStore;
