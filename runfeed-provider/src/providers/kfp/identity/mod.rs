//! KFP identity resolvers.
//!
//! Runs created by the operator embed a `ResourceReferences` document in their description.
//! Older runs only carry KFP resource references, and their pipeline name has to be recovered
//! from the workflow itself.

use std::sync::Arc;

use async_trait::async_trait;
use kube::core::DynamicObject;
use kube::ResourceExt;
use serde::Deserialize;

use super::api::{ApiRun, KfpApi, RELATIONSHIP_CREATOR, RELATIONSHIP_OWNER, RESOURCE_TYPE_JOB, RESOURCE_TYPE_NAMESPACE};
use crate::error::ProviderError;
use crate::providers::identity::{IdentityResolver, Resolution};
use runfeed_core::{labels, NamespacedName, ResourceReferences};

/// Everything known about a completed KFP run when resolving its identity.
#[derive(Clone, Debug)]
pub struct KfpRunContext {
    /// The run record of the KFP API.
    pub run: ApiRun,
    /// The workflow which executed the run.
    pub workflow: DynamicObject,
}

/// Parse a description document, mapping parse failures onto provider errors.
fn parse_description(description: &str) -> Result<Option<ResourceReferences>, ProviderError> {
    ResourceReferences::from_description(description).map_err(|err| ProviderError::Malformed(format!("invalid resource references document: {}", err)))
}

/// Reads the references document embedded in the run description.
pub struct DescriptionResolver;

#[async_trait]
impl IdentityResolver<KfpRunContext> for DescriptionResolver {
    fn name(&self) -> &'static str {
        "run-description"
    }

    async fn resolve(&self, ctx: &KfpRunContext) -> Result<Resolution, ProviderError> {
        Ok(match parse_description(&ctx.run.description)? {
            Some(references) => Resolution::Resolved(references),
            None => Resolution::Defer,
        })
    }
}

/// Follows the KFP resource references of runs which predate description documents.
pub struct LegacyReferencesResolver {
    api: Arc<dyn KfpApi>,
}

impl LegacyReferencesResolver {
    /// Create a new instance.
    pub fn new(api: Arc<dyn KfpApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityResolver<KfpRunContext> for LegacyReferencesResolver {
    fn name(&self) -> &'static str {
        "legacy-references"
    }

    async fn resolve(&self, ctx: &KfpRunContext) -> Result<Resolution, ProviderError> {
        let mut references = ResourceReferences::default();
        for reference in ctx.run.resource_references.iter() {
            if reference.is(RESOURCE_TYPE_JOB, RELATIONSHIP_CREATOR) {
                let job = self.api.get_job(&reference.key.id).await?;
                if let Some(found) = parse_description(&job.description)? {
                    return Ok(Resolution::Resolved(found));
                }
                references.run_configuration_name = NamespacedName::named(reference.name.as_str());
            } else if reference.is(RESOURCE_TYPE_NAMESPACE, RELATIONSHIP_OWNER) {
                references.run_name = NamespacedName::new(reference.key.id.as_str(), ctx.run.name.as_str());
            }
        }
        if references == ResourceReferences::default() {
            return Ok(Resolution::Defer);
        }
        Ok(Resolution::Resolved(references))
    }
}

#[derive(Deserialize)]
struct PipelineSpec {
    #[serde(default)]
    name: String,
}

/// Recovers the pipeline name from the workflow's pipeline spec annotation or entrypoint.
pub struct WorkflowPipelineNameResolver;

#[async_trait]
impl IdentityResolver<KfpRunContext> for WorkflowPipelineNameResolver {
    fn name(&self) -> &'static str {
        "workflow-pipeline-name"
    }

    async fn resolve(&self, ctx: &KfpRunContext) -> Result<Resolution, ProviderError> {
        let name = workflow_pipeline_name(&ctx.workflow);
        if name.is_empty() {
            return Ok(Resolution::Defer);
        }
        Ok(Resolution::Resolved(ResourceReferences {
            pipeline_name: NamespacedName::named(name),
            ..Default::default()
        }))
    }
}

/// The pipeline name recorded on a workflow, or an empty string.
pub fn workflow_pipeline_name(workflow: &DynamicObject) -> String {
    let from_annotation = workflow
        .annotations()
        .get(labels::PIPELINE_SPEC_ANNOTATION)
        .and_then(|spec| serde_json::from_str::<PipelineSpec>(spec).ok())
        .map(|spec| spec.name)
        .filter(|name| !name.is_empty());
    match from_annotation {
        Some(name) => name,
        None => workflow.data["spec"]["entrypoint"].as_str().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod mod_test;
