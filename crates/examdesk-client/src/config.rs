//! Client configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examdesk_core::Session;

use crate::http::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::store::FileSessionStore;

/// Top-level examdesk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamdeskConfig {
    /// Base URL of the REST API, including any `/api` prefix.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Where the session token and cached user are kept.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_session_file() -> PathBuf {
    config_dir()
        .map(|d| d.join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".examdesk-session.json"))
}

impl Default for ExamdeskConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            session_file: default_session_file(),
        }
    }
}

impl ExamdeskConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Session persisted in `session_file`.
    pub fn session(&self) -> Session {
        Session::new(Arc::new(FileSessionStore::new(&self.session_file)))
    }

    /// API client bound to `session`.
    pub fn client(&self, session: Session) -> Result<ApiClient> {
        ApiClient::new(&self.api_url, self.timeout(), session)
            .with_context(|| format!("failed to create API client for {}", self.api_url))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim; a `${...}` inside a value is not
/// expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examdesk.toml` in the current directory
/// 2. `~/.config/examdesk/config.toml`
///
/// Environment variable overrides: `EXAMDESK_API_URL`, `EXAMDESK_SESSION_FILE`.
pub fn load_config() -> Result<ExamdeskConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamdeskConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examdesk.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|d| d.join("config.toml"))
                    .filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamdeskConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamdeskConfig::default(),
    };

    if let Ok(url) = std::env::var("EXAMDESK_API_URL") {
        config.api_url = url;
    }
    if let Ok(file) = std::env::var("EXAMDESK_SESSION_FILE") {
        config.session_file = PathBuf::from(file);
    }

    config.api_url = resolve_env_vars(&config.api_url);
    config.session_file = PathBuf::from(resolve_env_vars(&config.session_file.to_string_lossy()));

    if config.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be at least 1");
    }
    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examdesk"))
}
