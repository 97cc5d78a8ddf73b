//! Run completion events.
//!
//! `RunCompletionEventData` is produced by a provider once a run reaches a terminal state and
//! is delivered to the operator over HTTP. The operator narrows it down into a
//! `RunCompletionEvent`, carrying only the artifacts which the owning resource declared.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::names::NamespacedName;

/// The terminal state of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCompletionStatus {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunCompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A named artifact location.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Artifact {
    pub name: String,
    pub location: String,
}

/// One produced instance of a component output.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ComponentArtifactInstance {
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A named output of a pipeline component.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ComponentArtifact {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artifacts: Vec<ComponentArtifactInstance>,
}

/// The outputs of a single component of a completed run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineComponent {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub component_artifacts: Vec<ComponentArtifact>,
}

/// A completed run as reported by a provider.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletionEventData {
    pub status: RunCompletionStatus,
    #[serde(default)]
    pub pipeline_name: NamespacedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_configuration_name: Option<NamespacedName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<NamespacedName>,
    #[serde(default)]
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serving_model_artifacts: Vec<Artifact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pipeline_components: Vec<PipelineComponent>,
    #[serde(default)]
    pub provider: String,
}

impl RunCompletionEventData {
    /// Convert into a consumer side event carrying the given filtered artifacts.
    pub fn into_event(self, artifacts: Vec<Artifact>) -> RunCompletionEvent {
        RunCompletionEvent {
            status: self.status,
            pipeline_name: self.pipeline_name,
            run_configuration_name: self.run_configuration_name,
            run_name: self.run_name,
            run_id: self.run_id,
            run_start_time: self.run_start_time,
            run_end_time: self.run_end_time,
            serving_model_artifacts: self.serving_model_artifacts,
            artifacts,
            provider: self.provider,
        }
    }
}

/// A completed run, narrowed to the artifacts declared by its owning resource.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletionEvent {
    pub status: RunCompletionStatus,
    pub pipeline_name: NamespacedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_configuration_name: Option<NamespacedName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<NamespacedName>,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serving_model_artifacts: Vec<Artifact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artifacts: Vec<Artifact>,
    pub provider: String,
}

/// Deserialize an explicit `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let val: Option<T> = Deserialize::deserialize(deserializer)?;
    Ok(val.unwrap_or_default())
}
