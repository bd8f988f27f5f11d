pub mod auth;
pub mod dashboard;
pub mod exams;
pub mod questions;
pub mod review;
pub mod take;

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use examdesk_client::{load_config_from, ApiClient, ExamdeskConfig};
use examdesk_core::routes::{self, Route, RouteDecision};
use examdesk_core::Session;

/// Config, session and client shared by every command.
pub struct App {
    pub config: ExamdeskConfig,
    pub session: Session,
    pub api: ApiClient,
}

impl App {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let session = config.session();
        let api = config.client(session.clone())?;
        Ok(Self {
            config,
            session,
            api,
        })
    }

    /// Load and pass the auth gate for `route`.
    pub fn for_route(config_path: Option<&Path>, route: Route) -> Result<Self> {
        let app = Self::load(config_path)?;
        app.require(route)?;
        Ok(app)
    }

    pub fn require(&self, route: Route) -> Result<()> {
        match routes::resolve(route, &self.session) {
            RouteDecision::Render(_) => Ok(()),
            RouteDecision::Redirect(Route::Login) => bail!(
                "Not logged in. Run `examdesk login --user <name> --password <password>` first."
            ),
            RouteDecision::Redirect(other) => bail!("{route} is not available here; go to {other}"),
        }
    }
}

/// Note on stderr that a saved change could not be followed by a reload.
pub fn warn_if_stale(stale: bool) {
    if stale {
        eprintln!("warning: the change was saved but the list could not be reloaded");
    }
}

/// Ask a yes/no question on stdin. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Shorten `text` to at most `max` characters for table cells.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
