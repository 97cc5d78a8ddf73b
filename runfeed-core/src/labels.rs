//! Canonical label, annotation and property names shared across the system.

/// Label set on Argo workflows holding the provider run id.
pub const PIPELINE_RUN_ID: &str = "pipeline/runid";
/// Idempotency marker set on a workflow once its completion event has been delivered.
pub const EVENTS_PUBLISHED: &str = "pipelines.kubeflow.org/events-published";
/// Label set by Argo holding the workflow phase.
pub const WORKFLOW_PHASE: &str = "workflows.argoproj.io/phase";
/// Annotation holding the compiled pipeline spec as JSON.
pub const PIPELINE_SPEC_ANNOTATION: &str = "pipelines.kubeflow.org/pipeline_spec";

/// Selector for workflows which belong to a run and have not yet been published.
pub const UNPUBLISHED_WORKFLOW_SELECTOR: &str = "pipeline/runid,pipelines.kubeflow.org/events-published!=true";

/// Log entry resource label holding the managed pipeline job id.
pub const PIPELINE_JOB_ID: &str = "pipeline_job_id";

// Labels written onto provider runs and pipeline jobs.
pub const PIPELINE_NAME: &str = "pipeline-name";
pub const PIPELINE_NAMESPACE: &str = "pipeline-namespace";
pub const RUN_CONFIGURATION_NAME: &str = "runconfiguration-name";
pub const RUN_CONFIGURATION_NAMESPACE: &str = "runconfiguration-namespace";
pub const RUN_NAME: &str = "run-name";
pub const RUN_NAMESPACE: &str = "run-namespace";
