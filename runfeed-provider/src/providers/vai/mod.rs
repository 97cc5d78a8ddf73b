//! Vertex AI Pipelines.
//!
//! Pipeline jobs are fetched over the Vertex AI REST API once their id has been received from
//! the subscription source. The job's labels carry its identity, and its task details carry the
//! produced artifacts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ProviderError;
use crate::providers::identity::{IdentityResolver, Resolution, ResolverChain};
use crate::providers::{check_response, Backend, CompletedRun};
use runfeed_core::{labels, Artifact, ComponentArtifact, ComponentArtifactInstance, NamespacedName, PipelineComponent, ResourceReferences, RunCompletionStatus};

/// The schema title of pushed model artifacts.
pub const PUSHED_MODEL_SCHEMA_TITLE: &str = "tfx.PushedModel";
/// Metadata property set to 1 once a model has been pushed.
pub const PUSHED_PROPERTY: &str = "pushed";
/// Metadata property holding the destination of a pushed model.
pub const PUSHED_DESTINATION_PROPERTY: &str = "pushed_destination";

const VAI_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// A Vertex AI pipeline job.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job_detail: PipelineJobDetail,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJobDetail {
    #[serde(default)]
    pub task_details: Vec<PipelineTaskDetail>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTaskDetail {
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub outputs: BTreeMap<String, ArtifactList>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ArtifactList {
    #[serde(default)]
    pub artifacts: Vec<TaskArtifact>,
}

/// An artifact produced by a task.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifact {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub schema_title: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Map a pipeline job state onto a completion status.
///
/// Returns `None` for states which are not terminal.
pub fn completion_status(state: &str) -> Option<RunCompletionStatus> {
    match state {
        "PIPELINE_STATE_SUCCEEDED" => Some(RunCompletionStatus::Succeeded),
        "PIPELINE_STATE_FAILED" | "PIPELINE_STATE_CANCELLED" => Some(RunCompletionStatus::Failed),
        _ => None,
    }
}

/// Access to pipeline jobs.
#[async_trait]
pub trait PipelineJobClient: Send + Sync + 'static {
    /// Fetch a pipeline job by its full resource name.
    async fn get_pipeline_job(&self, name: &str) -> Result<PipelineJob, ProviderError>;
}

/// A pipeline job client using the Vertex AI REST API.
pub struct RestPipelineJobClient {
    client: reqwest::Client,
    auth: Arc<dyn gcp_auth::TokenProvider>,
    endpoint: String,
}

impl RestPipelineJobClient {
    /// Create a new instance for the given region, using the ambient GCP credentials.
    pub async fn new(location: &str) -> Result<Self> {
        let auth = gcp_auth::provider().await.context("error initializing GCP auth")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("error building Vertex AI HTTP client")?;
        Ok(Self {
            client,
            auth,
            endpoint: format!("https://{}-aiplatform.googleapis.com/v1", location),
        })
    }
}

#[async_trait]
impl PipelineJobClient for RestPipelineJobClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_pipeline_job(&self, name: &str) -> Result<PipelineJob, ProviderError> {
        let token = self
            .auth
            .token(VAI_SCOPES)
            .await
            .map_err(|err| ProviderError::Transport(anyhow::Error::new(err).context("error fetching GCP access token")))?;
        let url = format!("{}/{}", self.endpoint, name);
        let res = self.client.get(&url).bearer_auth(token.as_str()).send().await?;
        let res = check_response(res, "Vertex AI GetPipelineJob").await?;
        Ok(res.json().await?)
    }
}

/// Reads the identity labels written onto pipeline jobs.
pub struct JobLabelsResolver;

#[async_trait]
impl IdentityResolver<PipelineJob> for JobLabelsResolver {
    fn name(&self) -> &'static str {
        "job-labels"
    }

    async fn resolve(&self, job: &PipelineJob) -> Result<Resolution, ProviderError> {
        let label = |key: &str| job.labels.get(key).cloned().unwrap_or_default();
        let references = ResourceReferences {
            pipeline_name: NamespacedName::new(label(labels::PIPELINE_NAMESPACE), label(labels::PIPELINE_NAME)),
            run_configuration_name: NamespacedName::new(label(labels::RUN_CONFIGURATION_NAMESPACE), label(labels::RUN_CONFIGURATION_NAME)),
            run_name: NamespacedName::new(label(labels::RUN_NAMESPACE), label(labels::RUN_NAME)),
            ..Default::default()
        };
        if references == ResourceReferences::default() {
            return Ok(Resolution::Defer);
        }
        Ok(Resolution::Resolved(references))
    }
}

/// The Vertex AI provider backend.
pub struct VaiProvider {
    project: String,
    location: String,
    client: Arc<dyn PipelineJobClient>,
    resolvers: ResolverChain<PipelineJob>,
}

impl VaiProvider {
    /// Create a new instance.
    pub fn new(project: &str, location: &str, client: Arc<dyn PipelineJobClient>) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            client,
            resolvers: ResolverChain::new(vec![Box::new(JobLabelsResolver)]),
        }
    }

    /// The full resource name of the pipeline job with the given id.
    pub fn pipeline_job_name(&self, job_id: &str) -> String {
        format!("projects/{}/locations/{}/pipelineJobs/{}", self.project, self.location, job_id)
    }
}

#[async_trait]
impl Backend for VaiProvider {
    type Raw = str;
    type Detail = PipelineJob;

    async fn completed(&self, job_id: &str) -> Result<Option<CompletedRun<PipelineJob>>, ProviderError> {
        let job = self.client.get_pipeline_job(&self.pipeline_job_name(job_id)).await?;
        let status = match completion_status(&job.state) {
            Some(status) => status,
            None => {
                tracing::debug!(%job_id, state = %job.state, "ignoring pipeline job which has not finished yet");
                return Ok(None);
            }
        };
        Ok(Some(CompletedRun {
            run_id: job_id.to_string(),
            status,
            start_time: job.start_time.filter(|ts| ts.timestamp() > 0),
            end_time: job.end_time.filter(|ts| ts.timestamp() > 0),
            detail: job,
        }))
    }

    async fn resolve_identity(&self, run: &CompletedRun<PipelineJob>) -> Result<ResourceReferences, ProviderError> {
        self.resolvers.resolve(&run.detail).await
    }

    async fn serving_artifacts(&self, run: &CompletedRun<PipelineJob>) -> Result<Vec<Artifact>, ProviderError> {
        Ok(serving_artifacts_of(&run.detail))
    }

    async fn pipeline_components(&self, run: &CompletedRun<PipelineJob>) -> Result<Vec<PipelineComponent>, ProviderError> {
        Ok(components_of(&run.detail))
    }
}

/// The pushed models among the task outputs of a job, named by their output.
pub fn serving_artifacts_of(job: &PipelineJob) -> Vec<Artifact> {
    let mut artifacts = vec![];
    for task in job.job_detail.task_details.iter() {
        for (name, output) in task.outputs.iter() {
            for artifact in output.artifacts.iter().filter(|artifact| artifact.schema_title == PUSHED_MODEL_SCHEMA_TITLE) {
                let pushed = artifact.metadata.get(PUSHED_PROPERTY).and_then(|val| val.as_f64());
                let destination = artifact.metadata.get(PUSHED_DESTINATION_PROPERTY).and_then(|val| val.as_str());
                if let (Some(pushed), Some(destination)) = (pushed, destination) {
                    if (pushed - 1.0).abs() < f64::EPSILON {
                        artifacts.push(Artifact {
                            name: name.clone(),
                            location: destination.to_string(),
                        });
                    }
                }
            }
        }
    }
    artifacts
}

/// The component tree of a job.
pub fn components_of(job: &PipelineJob) -> Vec<PipelineComponent> {
    job.job_detail
        .task_details
        .iter()
        .map(|task| PipelineComponent {
            name: task.task_name.clone(),
            component_artifacts: task
                .outputs
                .iter()
                .map(|(name, output)| ComponentArtifact {
                    name: name.clone(),
                    artifacts: output
                        .artifacts
                        .iter()
                        .map(|artifact| ComponentArtifactInstance {
                            uri: artifact.uri.clone(),
                            metadata: artifact.metadata.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}
