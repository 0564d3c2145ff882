//! Auth state and configuration.

use std::time::Duration;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_SESSION_SWEEP_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    session_sweep_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub const fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_sweep_seconds: DEFAULT_SESSION_SWEEP_SECONDS,
        }
    }

    #[must_use]
    pub const fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_session_sweep_seconds(mut self, seconds: u64) -> Self {
        self.session_sweep_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Interval between expired-session sweeps; never shorter than a second.
    #[must_use]
    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_seconds.max(1))
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Shared auth context handed to handlers through an `Extension`.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub const fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        assert_eq!(config.frontend_base_url(), "http://localhost:5173");
        assert_eq!(config.session_ttl_seconds(), 604_800);
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(300));
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn https_frontend_marks_cookie_secure() {
        let config = AuthConfig::new("https://todo.example.com".to_string())
            .with_session_ttl_seconds(60)
            .with_session_sweep_seconds(0);
        assert!(config.session_cookie_secure());
        assert_eq!(config.session_ttl_seconds(), 60);
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(1));
    }
}
