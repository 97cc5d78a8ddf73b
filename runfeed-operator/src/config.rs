//! Runtime configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The server's logging config, which uses Rust's `env_logger` directives.
    pub rust_log: String,
    /// The port of the run completion feed and healthcheck.
    #[serde(default = "Config::default_http_port")]
    pub http_port: u16,

    /// The address of the run completion event trigger service.
    ///
    /// Events are only forwarded when this is set.
    #[serde(default)]
    pub trigger_service_url: Option<String>,
    /// The timeout applied to each call to the trigger service.
    #[serde(default = "Config::default_trigger_timeout_seconds")]
    pub trigger_timeout_seconds: u64,
    /// The timeout applied to each K8s API call.
    #[serde(default = "Config::default_k8s_timeout_seconds")]
    pub k8s_timeout_seconds: u64,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this just parses the runtime environment and builds the application config
    /// from that.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings which can never work.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = self.trigger_service_url.as_deref() {
            let uri: http::Uri = url.parse().with_context(|| format!("invalid TRIGGER_SERVICE_URL {}", url))?;
            if uri.scheme().is_none() || uri.host().is_none() {
                bail!("TRIGGER_SERVICE_URL must be an absolute URL, got {}", url);
            }
        }
        if self.trigger_timeout_seconds == 0 || self.k8s_timeout_seconds == 0 {
            bail!("TRIGGER_TIMEOUT_SECONDS and K8S_TIMEOUT_SECONDS must be greater than zero");
        }
        Ok(())
    }

    fn default_http_port() -> u16 {
        8080
    }

    fn default_trigger_timeout_seconds() -> u64 {
        10
    }

    fn default_k8s_timeout_seconds() -> u64 {
        10
    }
}
