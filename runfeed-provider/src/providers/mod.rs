//! Provider backends.
//!
//! A provider turns a raw completion signal into a `RunCompletionEventData`. Every backend
//! implements `Backend`, and the configured one is selected once at startup as a `RunProvider`
//! variant.

pub mod identity;
pub mod kfp;
pub mod vai;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::core::DynamicObject;

use crate::config::{Config, ProviderType};
use crate::error::ProviderError;
pub use kfp::KfpProvider;
use runfeed_core::{Artifact, PipelineComponent, ResourceReferences, RunCompletionEventData, RunCompletionStatus};
pub use vai::VaiProvider;

/// A provider specific completion signal, as emitted by a source.
#[derive(Clone, Debug)]
pub enum RawEvent {
    /// A snapshot of an Argo workflow.
    Workflow(DynamicObject),
    /// The id of a managed pipeline job.
    PipelineJob(String),
}

impl RawEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Workflow(_) => "workflow",
            Self::PipelineJob(_) => "pipeline job",
        }
    }
}

/// A run which has reached a terminal state, along with backend specific detail.
#[derive(Clone, Debug)]
pub struct CompletedRun<D> {
    pub run_id: String,
    pub status: RunCompletionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub detail: D,
}

/// The capabilities every provider backend offers.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The raw signal consumed by this backend.
    type Raw: Sync + ?Sized;
    /// Backend specific detail carried along with a completed run.
    type Detail: Send + Sync;

    /// Check whether the raw signal describes a terminal run, returning `None` if it does not.
    async fn completed(&self, raw: &Self::Raw) -> Result<Option<CompletedRun<Self::Detail>>, ProviderError>;
    /// Resolve the K8s resources which the run belongs to.
    async fn resolve_identity(&self, run: &CompletedRun<Self::Detail>) -> Result<ResourceReferences, ProviderError>;
    /// Collect the serving model artifacts pushed by the run.
    async fn serving_artifacts(&self, run: &CompletedRun<Self::Detail>) -> Result<Vec<Artifact>, ProviderError>;
    /// Collect the outputs of every component of the run.
    async fn pipeline_components(&self, run: &CompletedRun<Self::Detail>) -> Result<Vec<PipelineComponent>, ProviderError>;
}

/// Convert a raw signal into a completion event using the given backend.
///
/// Returns `Ok(None)` when the run has not reached a terminal state.
pub async fn convert<B: Backend>(backend: &B, provider: &str, raw: &B::Raw) -> Result<Option<RunCompletionEventData>, ProviderError> {
    let run = match backend.completed(raw).await? {
        Some(run) => run,
        None => return Ok(None),
    };
    let references = backend.resolve_identity(&run).await?;
    let serving_model_artifacts = backend.serving_artifacts(&run).await?;
    let pipeline_components = backend.pipeline_components(&run).await?;

    Ok(Some(RunCompletionEventData {
        status: run.status,
        pipeline_name: references.pipeline_name,
        run_configuration_name: references.run_configuration_name.non_empty(),
        run_name: references.run_name.non_empty(),
        run_id: run.run_id,
        run_start_time: references.created_at.or(run.start_time),
        run_end_time: references.finished_at.or(run.end_time),
        serving_model_artifacts,
        pipeline_components,
        provider: provider.to_string(),
    }))
}

/// The provider backend selected for this process.
pub enum RunProvider {
    Kfp(KfpProvider),
    Vai(VaiProvider),
}

impl RunProvider {
    /// Build the provider backend described by the given config.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.provider_type {
            ProviderType::Kfp => {
                let api_address = config.kfp_api_address.as_deref().context("KFP_API_ADDRESS is required for provider type kfp")?;
                let store_address = config
                    .metadata_store_address
                    .as_deref()
                    .context("METADATA_STORE_ADDRESS is required for provider type kfp")?;
                let api = kfp::RestKfpApi::new(api_address)?;
                let store = kfp::GrpcMetadataStore::new(store_address)?;
                Ok(Self::Kfp(KfpProvider::new(Arc::new(api), Arc::new(store))))
            }
            ProviderType::Vai => {
                let project = config.vai_project.as_deref().context("VAI_PROJECT is required for provider type vai")?;
                let location = config.vai_location.as_deref().context("VAI_LOCATION is required for provider type vai")?;
                let client = vai::RestPipelineJobClient::new(location).await?;
                Ok(Self::Vai(VaiProvider::new(project, location, Arc::new(client))))
            }
        }
    }

    /// Convert a raw signal into a completion event.
    ///
    /// Returns `Ok(None)` when the run has not reached a terminal state.
    pub async fn convert(&self, provider: &str, raw: &RawEvent) -> Result<Option<RunCompletionEventData>, ProviderError> {
        match (self, raw) {
            (Self::Kfp(kfp), RawEvent::Workflow(workflow)) => convert(kfp, provider, workflow).await,
            (Self::Vai(vai), RawEvent::PipelineJob(job_id)) => convert(vai, provider, job_id.as_str()).await,
            (_, raw) => Err(ProviderError::Malformed(format!("{} provider can not handle a {} event", self.kind(), raw.kind()))),
        }
    }

    fn kind(&self) -> ProviderType {
        match self {
            Self::Kfp(_) => ProviderType::Kfp,
            Self::Vai(_) => ProviderType::Vai,
        }
    }
}

/// Map an unsuccessful HTTP response from a provider API onto a provider error.
pub(crate) async fn check_response(res: reqwest::Response, what: &str) -> Result<reqwest::Response, ProviderError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(format!("{}: {}", what, body)));
    }
    Err(ProviderError::Api(format!("{} returned status {}: {}", what, status, body)))
}
