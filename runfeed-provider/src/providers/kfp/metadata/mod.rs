//! ML metadata store queries.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use crate::error::ProviderError;
use crate::grpc::{self, EventType, MetadataStoreServiceClient, ValueKind};
use runfeed_core::{Artifact, ComponentArtifact, ComponentArtifactInstance, PipelineComponent};

/// The artifact type of pushed models.
pub const PUSHED_MODEL_ARTIFACT_TYPE: &str = "PushedModel";
/// The context type grouping everything produced by a pipeline run.
pub const PIPELINE_RUN_CONTEXT_TYPE: &str = "system.PipelineRun";
/// Custom property holding a pushed model's name.
pub const NAME_PROPERTY: &str = "name";
/// Custom property set to 1 once a model has been pushed.
pub const PUSHED_PROPERTY: &str = "pushed";
/// Custom property holding the display name of executions and artifacts.
pub const DISPLAY_NAME_PROPERTY: &str = "display_name";

/// Artifact queries against the metadata store.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// The serving model artifacts pushed by the given workflow.
    async fn serving_artifacts(&self, workflow_name: &str) -> Result<Vec<Artifact>, ProviderError>;
    /// The outputs of every component of the given run.
    async fn artifacts_for_run(&self, run_id: &str) -> Result<Vec<PipelineComponent>, ProviderError>;
}

/// A metadata store accessed over gRPC.
pub struct GrpcMetadataStore {
    client: MetadataStoreServiceClient<Channel>,
}

impl GrpcMetadataStore {
    /// Create a new instance, connecting lazily to the given address.
    pub fn new(address: &str) -> Result<Self> {
        let address = if address.contains("://") { address.to_string() } else { format!("http://{}", address) };
        let endpoint = Endpoint::from_shared(address).context("invalid metadata store address")?;
        Ok(Self {
            client: MetadataStoreServiceClient::new(endpoint.connect_lazy()),
        })
    }

    /// Look up the run context with the given name.
    async fn run_context(&self, name: &str) -> Result<Option<grpc::Context>, ProviderError> {
        let req = grpc::GetContextByTypeAndNameRequest {
            type_name: Some(PIPELINE_RUN_CONTEXT_TYPE.into()),
            context_name: Some(name.into()),
        };
        let res = self.client.clone().get_context_by_type_and_name(req).await?;
        Ok(res.into_inner().context)
    }
}

#[async_trait]
impl MetadataStore for GrpcMetadataStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn serving_artifacts(&self, workflow_name: &str) -> Result<Vec<Artifact>, ProviderError> {
        let req = grpc::GetArtifactTypeRequest {
            type_name: Some(PUSHED_MODEL_ARTIFACT_TYPE.into()),
        };
        let artifact_type = match self.client.clone().get_artifact_type(req).await {
            Ok(res) => res.into_inner().artifact_type,
            // No model has ever been pushed.
            Err(status) if status.code() == tonic::Code::NotFound => return Ok(vec![]),
            Err(status) => return Err(status.into()),
        };
        let type_id = artifact_type.and_then(|typ| typ.id).unwrap_or_default();
        if type_id == 0 {
            return Err(ProviderError::Malformed(format!("invalid id for artifact type {}", PUSHED_MODEL_ARTIFACT_TYPE)));
        }

        let context_id = self.run_context(workflow_name).await?.and_then(|ctx| ctx.id).unwrap_or_default();
        if context_id == 0 {
            return Err(ProviderError::Malformed(format!("invalid run context id for workflow {}", workflow_name)));
        }
        let req = grpc::GetArtifactsByContextRequest { context_id: Some(context_id) };
        let artifacts = self.client.clone().get_artifacts_by_context(req).await?.into_inner().artifacts;
        Ok(serving_artifacts_of(type_id, artifacts))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn artifacts_for_run(&self, run_id: &str) -> Result<Vec<PipelineComponent>, ProviderError> {
        let context_id = match self.run_context(run_id).await?.and_then(|ctx| ctx.id) {
            Some(id) => id,
            None => return Err(ProviderError::Malformed(format!("no run context found for run {}", run_id))),
        };

        let req = grpc::GetExecutionsByContextRequest { context_id: Some(context_id) };
        let executions = self.client.clone().get_executions_by_context(req).await?.into_inner().executions;
        let execution_ids = executions.iter().filter_map(|exec| exec.id).collect();

        let req = grpc::GetEventsByExecutionIDsRequest { execution_ids };
        let events = self.client.clone().get_events_by_execution_i_ds(req).await?.into_inner().events;
        let artifact_ids = output_artifact_ids(&events).into_values().flatten().collect::<Vec<_>>();

        let artifacts = if artifact_ids.is_empty() {
            vec![]
        } else {
            let req = grpc::GetArtifactsByIdRequest { artifact_ids };
            self.client.clone().get_artifacts_by_id(req).await?.into_inner().artifacts
        };
        Ok(components_of(&executions, &events, artifacts))
    }
}

/// Select the pushed models among the artifacts of a run context.
pub fn serving_artifacts_of(pushed_model_type_id: i64, artifacts: Vec<grpc::Artifact>) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .filter(|artifact| artifact.type_id == Some(pushed_model_type_id))
        .filter_map(|artifact| {
            let name = match artifact.custom_properties.get(NAME_PROPERTY).and_then(|val| val.value.as_ref()) {
                Some(ValueKind::StringValue(name)) if !name.is_empty() => name.clone(),
                _ => return None,
            };
            let pushed = matches!(
                artifact.custom_properties.get(PUSHED_PROPERTY).and_then(|val| val.value.as_ref()),
                Some(ValueKind::IntValue(1))
            );
            let location = artifact.uri.unwrap_or_default();
            if !pushed || location.is_empty() {
                return None;
            }
            Some(Artifact { name, location })
        })
        .collect()
}

/// Group the artifact ids of output events by the execution which produced them.
fn output_artifact_ids(events: &[grpc::Event]) -> BTreeMap<i64, Vec<i64>> {
    let mut ids: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for event in events.iter().filter(|event| event.r#type == Some(EventType::Output as i32)) {
        if let (Some(execution_id), Some(artifact_id)) = (event.execution_id, event.artifact_id) {
            ids.entry(execution_id).or_default().push(artifact_id);
        }
    }
    ids
}

/// Build the component tree of a run from its executions and their output artifacts.
///
/// Executions and artifacts without a display name are skipped, as are components which
/// produced no artifacts.
pub fn components_of(executions: &[grpc::Execution], events: &[grpc::Event], artifacts: Vec<grpc::Artifact>) -> Vec<PipelineComponent> {
    let outputs = output_artifact_ids(events);
    let by_id: HashMap<i64, grpc::Artifact> = artifacts.into_iter().filter_map(|artifact| artifact.id.map(|id| (id, artifact))).collect();

    executions
        .iter()
        .filter_map(|exec| {
            let name = display_name(&exec.custom_properties)?;
            let component_artifacts: Vec<ComponentArtifact> = outputs
                .get(&exec.id?)
                .into_iter()
                .flatten()
                .filter_map(|artifact_id| by_id.get(artifact_id))
                .filter_map(|artifact| {
                    Some(ComponentArtifact {
                        name: display_name(&artifact.custom_properties)?,
                        artifacts: vec![ComponentArtifactInstance {
                            uri: artifact.uri.clone().unwrap_or_default(),
                            metadata: properties_to_metadata(&artifact.properties),
                        }],
                    })
                })
                .collect();
            if component_artifacts.is_empty() {
                return None;
            }
            Some(PipelineComponent { name, component_artifacts })
        })
        .collect()
}

fn display_name(properties: &HashMap<String, grpc::Value>) -> Option<String> {
    match properties.get(DISPLAY_NAME_PROPERTY).and_then(|val| val.value.as_ref()) {
        Some(ValueKind::StringValue(name)) => Some(name.clone()),
        _ => None,
    }
}

/// Convert metadata store properties into JSON values.
pub fn properties_to_metadata(properties: &HashMap<String, grpc::Value>) -> HashMap<String, serde_json::Value> {
    properties
        .iter()
        .filter_map(|(key, val)| {
            let val = match val.value.as_ref()? {
                ValueKind::IntValue(val) => serde_json::Value::from(*val),
                ValueKind::DoubleValue(val) => serde_json::Value::from(*val),
                ValueKind::StringValue(val) => serde_json::Value::from(val.as_str()),
                ValueKind::BoolValue(val) => serde_json::Value::from(*val),
            };
            Some((key.clone(), val))
        })
        .collect()
}
