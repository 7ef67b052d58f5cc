//! Coordinator configuration.
//!
//! Per-page differences (redirect targets, whether the login field accepts
//! a username) are configuration passed at construction, not branches
//! scattered through the flows.

use std::time::Duration;

const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 20 * 60;

/// Tuning and page-wiring knobs for
/// [`SessionCoordinator`](crate::coordinator::SessionCoordinator).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long without tracked activity before a forced client-side logout.
    pub inactivity_timeout: Duration,
    /// Accept a username in the login identifier field and resolve it to an
    /// email through the profile store.
    pub login_with_username: bool,
    /// Where forced logouts (inactivity, ban) send the visitor.
    pub login_page: String,
    /// Where a normal logout sends the visitor.
    pub home_page: String,
    /// Where a denied role check sends the visitor.
    pub fallback_page: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(DEFAULT_INACTIVITY_TIMEOUT_SECS),
            login_with_username: false,
            login_page: "login.html".to_owned(),
            home_page: "index.html".to_owned(),
            fallback_page: "dashboard.html".to_owned(),
        }
    }
}

impl CoordinatorConfig {
    /// Defaults with the timeout overridable via
    /// `AUTH_INACTIVITY_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let secs = env_parse("AUTH_INACTIVITY_TIMEOUT_SECS", DEFAULT_INACTIVITY_TIMEOUT_SECS);
        Self {
            inactivity_timeout: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
