//! Runtime configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// The backend which executes pipeline runs.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Kubeflow Pipelines on Argo Workflows.
    Kfp,
    /// Vertex AI Pipelines.
    Vai,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kfp => write!(f, "kfp"),
            Self::Vai => write!(f, "vai"),
        }
    }
}

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The server's logging config, which uses Rust's `env_logger` directives.
    pub rust_log: String,

    /// The name of this provider, stamped onto every event.
    pub provider_name: String,
    /// The backend which this provider watches.
    pub provider_type: ProviderType,
    /// The URL of the operator's run completion feed.
    pub operator_webhook: String,
    /// The timeout applied to each delivery to the operator.
    #[serde(default = "Config::default_webhook_timeout_seconds")]
    pub webhook_timeout_seconds: u64,

    /// The Kubernetes namespace of the workflows to watch, or empty for all namespaces.
    #[serde(default)]
    pub namespace: String,
    /// The address of the Kubeflow Pipelines REST API.
    #[serde(default)]
    pub kfp_api_address: Option<String>,
    /// The address of the ML metadata store gRPC API.
    #[serde(default)]
    pub metadata_store_address: Option<String>,

    /// The GCP project hosting Vertex AI.
    #[serde(default)]
    pub vai_project: Option<String>,
    /// The GCP region hosting Vertex AI.
    #[serde(default)]
    pub vai_location: Option<String>,
    /// The Pub/Sub subscription receiving pipeline job log entries.
    #[serde(default)]
    pub pubsub_subscription: Option<String>,
    /// The delay between Pub/Sub pulls which returned no messages.
    #[serde(default = "Config::default_pubsub_poll_seconds")]
    pub pubsub_poll_seconds: u64,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this routing just parses the runtime environment and builds the application
    /// config from that.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        config.validate()?;
        Ok(config)
    }

    /// Ensure the settings required by the configured provider type are present.
    pub fn validate(&self) -> Result<()> {
        match self.provider_type {
            ProviderType::Kfp => {
                if self.kfp_api_address.is_none() {
                    bail!("KFP_API_ADDRESS is required for provider type kfp");
                }
                if self.metadata_store_address.is_none() {
                    bail!("METADATA_STORE_ADDRESS is required for provider type kfp");
                }
            }
            ProviderType::Vai => {
                if self.vai_project.is_none() || self.vai_location.is_none() {
                    bail!("VAI_PROJECT and VAI_LOCATION are required for provider type vai");
                }
                if self.pubsub_subscription.is_none() {
                    bail!("PUBSUB_SUBSCRIPTION is required for provider type vai");
                }
            }
        }
        Ok(())
    }

    fn default_webhook_timeout_seconds() -> u64 {
        10
    }

    fn default_pubsub_poll_seconds() -> u64 {
        5
    }
}

#[cfg(test)]
impl Config {
    /// Create a KFP config for use in tests.
    pub fn new_test() -> Self {
        Self {
            rust_log: "error".into(),
            provider_name: "kfp-provider".into(),
            provider_type: ProviderType::Kfp,
            operator_webhook: "http://localhost:8080/events".into(),
            webhook_timeout_seconds: 1,
            namespace: String::new(),
            kfp_api_address: Some("http://localhost:8888".into()),
            metadata_store_address: Some("http://localhost:8080".into()),
            vai_project: None,
            vai_location: None,
            pubsub_subscription: None,
            pubsub_poll_seconds: 1,
        }
    }
}
