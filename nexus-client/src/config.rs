use nexus_core::config::get_env;
use nexus_core::error::AppError;
use std::time::Duration;

/// Where the client sends requests and how patient it is.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub use_proxy: bool,
    pub proxy_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay before the single retry of a timed-out request.
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            use_proxy: false,
            proxy_url: "http://localhost:5001".to_string(),
            timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 150,
        }
    }
}

impl ClientConfig {
    /// Read `API_URL`, `USE_PROXY` and `PROXY_URL`, falling back to the
    /// local development defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let use_proxy = get_env("USE_PROXY", Some("false"), false)?;

        Ok(Self {
            api_url: get_env("API_URL", Some(&defaults.api_url), false)?,
            use_proxy: matches!(use_proxy.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
            proxy_url: get_env("PROXY_URL", Some(&defaults.proxy_url), false)?,
            ..defaults
        })
    }

    /// Base URL requests go to: the proxy when enabled, else the API.
    pub fn base_url(&self) -> &str {
        let url = if self.use_proxy {
            &self.proxy_url
        } else {
            &self.api_url
        };
        url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefers_proxy_when_enabled() {
        let mut config = ClientConfig {
            api_url: "http://api:5000/".into(),
            proxy_url: "http://proxy:5001".into(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://api:5000");
        config.use_proxy = true;
        assert_eq!(config.base_url(), "http://proxy:5001");
    }
}
