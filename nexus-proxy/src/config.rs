use nexus_core::config::{self as core_config, get_env};
use nexus_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub common: core_config::Config,
    /// Backend origin, without a trailing slash.
    pub upstream_url: String,
    pub port: u16,
    pub timeout: Duration,
}

impl ProxyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        let upstream_url = get_env("PROXY_UPSTREAM_URL", Some("http://localhost:5000"), is_prod)?;
        let port = get_env("PROXY_PORT", Some("8888"), is_prod)?
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid PROXY_PORT: {}", e)))?;

        Ok(Self {
            common,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            port,
            timeout: Duration::from_secs(30),
        })
    }
}
