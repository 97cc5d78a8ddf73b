//! Run CRD.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::OutputArtifact;
use crate::event::RunCompletionStatus;

pub type Run = RunCRD; // Mostly to resolve a Rust Analyzer issue.

/// CRD spec for the Run resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, CustomResource, JsonSchema)]
#[kube(
    struct = "RunCRD",
    status = "RunStatus",
    group = "pipelines.kubeflow.org",
    version = "v1alpha6",
    kind = "Run",
    namespaced,
    derive = "PartialEq",
    apiextensions = "v1",
    shortname = "mlr",
    printcolumn = r#"{"name":"CompletionState","type":"string","jsonPath":".status.completionState"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RunSpec {
    /// The provider which executes this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// The pipeline executed by this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    /// Outputs of the run which are surfaced on its completion event.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<OutputArtifact>,
}

/// The terminal state recorded on a Run.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub enum CompletionState {
    Succeeded,
    Failed,
}

impl From<RunCompletionStatus> for CompletionState {
    fn from(src: RunCompletionStatus) -> Self {
        match src {
            RunCompletionStatus::Succeeded => Self::Succeeded,
            RunCompletionStatus::Failed => Self::Failed,
        }
    }
}

/// CRD status object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_state: Option<CompletionState>,
}
