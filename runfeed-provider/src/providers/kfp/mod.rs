//! Kubeflow Pipelines on Argo Workflows.

mod api;
mod identity;
mod metadata;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::core::DynamicObject;
use kube::ResourceExt;

use crate::error::ProviderError;
use crate::providers::identity::ResolverChain;
use crate::providers::{Backend, CompletedRun};
pub use api::{ApiJob, ApiRun, KfpApi, ResourceKey, ResourceReference, RestKfpApi};
pub use identity::{workflow_pipeline_name, DescriptionResolver, KfpRunContext, LegacyReferencesResolver, WorkflowPipelineNameResolver};
pub use metadata::{GrpcMetadataStore, MetadataStore};
use runfeed_core::{labels, Artifact, PipelineComponent, ResourceReferences, RunCompletionStatus};

/// Map an Argo workflow phase onto a completion status.
///
/// Returns `None` for phases which are not terminal.
pub fn completion_status(phase: &str) -> Option<RunCompletionStatus> {
    match phase {
        "Succeeded" => Some(RunCompletionStatus::Succeeded),
        "Failed" | "Error" => Some(RunCompletionStatus::Failed),
        _ => None,
    }
}

/// The KFP provider backend.
pub struct KfpProvider {
    api: Arc<dyn KfpApi>,
    metadata: Arc<dyn MetadataStore>,
    resolvers: ResolverChain<KfpRunContext>,
}

impl KfpProvider {
    /// Create a new instance.
    pub fn new(api: Arc<dyn KfpApi>, metadata: Arc<dyn MetadataStore>) -> Self {
        let resolvers = ResolverChain::new(vec![
            Box::new(DescriptionResolver),
            Box::new(LegacyReferencesResolver::new(api.clone())),
            Box::new(WorkflowPipelineNameResolver),
        ]);
        Self { api, metadata, resolvers }
    }
}

/// Read an RFC 3339 timestamp from the workflow status.
fn status_time(workflow: &DynamicObject, field: &str) -> Option<DateTime<Utc>> {
    workflow.data["status"][field]
        .as_str()
        .and_then(|val| DateTime::parse_from_rfc3339(val).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

#[async_trait]
impl Backend for KfpProvider {
    type Raw = DynamicObject;
    type Detail = DynamicObject;

    async fn completed(&self, workflow: &DynamicObject) -> Result<Option<CompletedRun<DynamicObject>>, ProviderError> {
        let workflow_labels = workflow.labels();
        let status = match workflow_labels.get(labels::WORKFLOW_PHASE).and_then(|phase| completion_status(phase)) {
            Some(status) => status,
            None => {
                tracing::debug!(name = %workflow.name(), "ignoring workflow which has not finished yet");
                return Ok(None);
            }
        };
        if workflow.metadata.name.as_deref().unwrap_or_default().is_empty() {
            return Ok(None);
        }
        let run_id = workflow_labels.get(labels::PIPELINE_RUN_ID).cloned().unwrap_or_default();
        if run_id.is_empty() {
            tracing::warn!(name = %workflow.name(), "ignoring finished workflow without a run id");
            return Ok(None);
        }
        Ok(Some(CompletedRun {
            run_id,
            status,
            start_time: status_time(workflow, "startedAt"),
            end_time: status_time(workflow, "finishedAt"),
            detail: workflow.clone(),
        }))
    }

    #[tracing::instrument(level = "debug", skip(self, run), fields(run_id = %run.run_id))]
    async fn resolve_identity(&self, run: &CompletedRun<DynamicObject>) -> Result<ResourceReferences, ProviderError> {
        let ctx = KfpRunContext {
            run: self.api.get_run(&run.run_id).await?,
            workflow: run.detail.clone(),
        };
        let mut references = self.resolvers.resolve(&ctx).await?;
        references.created_at = ctx.run.created_at;
        references.finished_at = ctx.run.finished_at;
        Ok(references)
    }

    async fn serving_artifacts(&self, run: &CompletedRun<DynamicObject>) -> Result<Vec<Artifact>, ProviderError> {
        self.metadata.serving_artifacts(&run.detail.name()).await
    }

    async fn pipeline_components(&self, run: &CompletedRun<DynamicObject>) -> Result<Vec<PipelineComponent>, ProviderError> {
        self.metadata.artifacts_for_run(&run.run_id).await
    }
}

#[cfg(test)]
pub mod fixtures;
