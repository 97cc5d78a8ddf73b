//! Pipeline operator CRDs.
//!
//! Only the parts of the Run and RunConfiguration resources which the run completion feed
//! reads or writes are modelled here. Unknown fields are ignored when reading.

mod artifact;
mod run;
mod run_configuration;

use kube::Resource;

pub use artifact::{ArtifactLocator, ArtifactPath, OutputArtifact, ARTIFACT_PATH_PATTERN};
pub use run::{CompletionState, Run, RunSpec, RunStatus};
pub use run_configuration::{LatestRuns, RunConfiguration, RunConfigurationSpec, RunConfigurationStatus, RunReference};

/// A convenience trait built around the fact that all implementors
/// must have the following attributes.
pub trait RequiredMetadata {
    /// The namespace of this object.
    fn namespace(&self) -> &str;

    /// The name of this object.
    fn name(&self) -> &str;
}

impl RequiredMetadata for Run {
    fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }
}

impl RequiredMetadata for RunConfiguration {
    fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }
}
