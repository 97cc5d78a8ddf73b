//! RunConfiguration CRD.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::RunSpec;
use crate::event::Artifact;

pub type RunConfiguration = RunConfigurationCRD; // Mostly to resolve a Rust Analyzer issue.

/// CRD spec for the RunConfiguration resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, CustomResource, JsonSchema)]
#[kube(
    struct = "RunConfigurationCRD",
    status = "RunConfigurationStatus",
    group = "pipelines.kubeflow.org",
    version = "v1alpha6",
    kind = "RunConfiguration",
    namespaced,
    derive = "PartialEq",
    apiextensions = "v1",
    shortname = "mlrc",
    printcolumn = r#"{"name":"LatestSucceeded","type":"string","jsonPath":".status.latestRuns.succeeded.providerId"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RunConfigurationSpec {
    /// The template of each run created by this configuration.
    #[serde(default)]
    pub run: RunSpec,
}

/// A reference to a run produced by a RunConfiguration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

/// The most recent runs of a RunConfiguration, by outcome.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct LatestRuns {
    #[serde(default)]
    pub succeeded: RunReference,
}

/// CRD status object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunConfigurationStatus {
    #[serde(default)]
    pub latest_runs: LatestRuns,
}
