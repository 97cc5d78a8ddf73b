//! Access to the pipeline resources referenced by run completion events.

use std::time::Duration;

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::client::Client;
use serde_json::json;
use tokio::time::timeout;

use crate::error::ResourceError;
use runfeed_core::crd::{Run, RunConfiguration, RunConfigurationStatus, RunStatus};
use runfeed_core::NamespacedName;

/// Reads and status updates of Run and RunConfiguration resources.
#[async_trait]
pub trait PipelineResources: Send + Sync + 'static {
    async fn get_run(&self, name: &NamespacedName) -> Result<Run, ResourceError>;

    async fn get_run_configuration(&self, name: &NamespacedName) -> Result<RunConfiguration, ResourceError>;

    /// Merge the given status into the named Run's status.
    async fn patch_run_status(&self, name: &NamespacedName, status: &RunStatus) -> Result<(), ResourceError>;

    /// Merge the given status into the named RunConfiguration's status.
    async fn patch_run_configuration_status(&self, name: &NamespacedName, status: &RunConfigurationStatus) -> Result<(), ResourceError>;
}

/// Pipeline resources accessed through the K8s API.
pub struct KubeResources {
    client: Client,
    /// The timeout applied to each API call.
    timeout: Duration,
}

impl KubeResources {
    /// Create a new instance.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl PipelineResources for KubeResources {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_run(&self, name: &NamespacedName) -> Result<Run, ResourceError> {
        let api: Api<Run> = Api::namespaced(self.client.clone(), &name.namespace);
        let resource = format!("Run {}", name);
        timeout(self.timeout, api.get(&name.name))
            .await
            .map_err(|_| ResourceError::Timeout(resource.clone()))?
            .map_err(|err| ResourceError::from_kube(&resource, err))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_run_configuration(&self, name: &NamespacedName) -> Result<RunConfiguration, ResourceError> {
        let api: Api<RunConfiguration> = Api::namespaced(self.client.clone(), &name.namespace);
        let resource = format!("RunConfiguration {}", name);
        timeout(self.timeout, api.get(&name.name))
            .await
            .map_err(|_| ResourceError::Timeout(resource.clone()))?
            .map_err(|err| ResourceError::from_kube(&resource, err))
    }

    #[tracing::instrument(level = "debug", skip(self, status))]
    async fn patch_run_status(&self, name: &NamespacedName, status: &RunStatus) -> Result<(), ResourceError> {
        tracing::info!(%name, "patching Run status");
        let api: Api<Run> = Api::namespaced(self.client.clone(), &name.namespace);
        let resource = format!("Run {}", name);
        let patch = Patch::Merge(json!({ "status": status }));
        timeout(self.timeout, api.patch_status(&name.name, &PatchParams::apply(runfeed_core::APP_NAME), &patch))
            .await
            .map_err(|_| ResourceError::Timeout(resource.clone()))?
            .map(|_| ())
            .map_err(|err| ResourceError::from_kube(&resource, err))
    }

    #[tracing::instrument(level = "debug", skip(self, status))]
    async fn patch_run_configuration_status(&self, name: &NamespacedName, status: &RunConfigurationStatus) -> Result<(), ResourceError> {
        tracing::info!(%name, "patching RunConfiguration status");
        let api: Api<RunConfiguration> = Api::namespaced(self.client.clone(), &name.namespace);
        let resource = format!("RunConfiguration {}", name);
        let patch = Patch::Merge(json!({ "status": status }));
        timeout(self.timeout, api.patch_status(&name.name, &PatchParams::apply(runfeed_core::APP_NAME), &patch))
            .await
            .map_err(|_| ResourceError::Timeout(resource.clone()))?
            .map(|_| ())
            .map_err(|err| ResourceError::from_kube(&resource, err))
    }
}
