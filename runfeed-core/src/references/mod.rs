//! The resolved identity of a provider run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crd::OutputArtifact;
use crate::names::NamespacedName;

/// The K8s resources which a provider run belongs to.
///
/// Embedded as a YAML document in the description of runs and recurring jobs created by the
/// operator. Any of the names may be empty when a run predates the embedded document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReferences {
    #[serde(default)]
    pub pipeline_name: NamespacedName,
    #[serde(default)]
    pub run_configuration_name: NamespacedName,
    #[serde(default)]
    pub run_name: NamespacedName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<OutputArtifact>,
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ResourceReferences {
    /// Parse the document embedded in a run or job description.
    ///
    /// Returns `Ok(None)` for an empty description.
    pub fn from_description(description: &str) -> Result<Option<Self>, serde_yaml::Error> {
        if description.trim().is_empty() {
            return Ok(None);
        }
        serde_yaml::from_str(description).map(Some)
    }

    /// True once a pipeline name and at least one of run or run configuration are known.
    pub fn is_complete(&self) -> bool {
        !self.pipeline_name.is_empty() && (!self.run_name.is_empty() || !self.run_configuration_name.is_empty())
    }

    /// Fill every empty field of `self` from `other`.
    pub fn merge_missing(&mut self, other: ResourceReferences) {
        if self.pipeline_name.is_empty() {
            self.pipeline_name = other.pipeline_name;
        }
        if self.run_configuration_name.is_empty() {
            self.run_configuration_name = other.run_configuration_name;
        }
        if self.run_name.is_empty() {
            self.run_name = other.run_name;
        }
        if self.artifacts.is_empty() {
            self.artifacts = other.artifacts;
        }
        if self.created_at.is_none() {
            self.created_at = other.created_at;
        }
        if self.finished_at.is_none() {
            self.finished_at = other.finished_at;
        }
    }
}
