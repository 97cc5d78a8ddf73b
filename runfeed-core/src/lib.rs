pub mod crd;
pub mod error;
pub mod event;
pub mod labels;
pub mod names;
pub mod references;

pub use error::CoreError;
pub use event::{Artifact, ComponentArtifact, ComponentArtifactInstance, PipelineComponent, RunCompletionEvent, RunCompletionEventData, RunCompletionStatus};
pub use names::NamespacedName;
pub use references::ResourceReferences;

/// The field manager name used when patching K8s objects.
pub const APP_NAME: &str = "runfeed";
