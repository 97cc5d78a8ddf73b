//! Records run completions on the Run and RunConfiguration resources.

use std::sync::Arc;

use async_trait::async_trait;
use runfeed_core::crd::{CompletionState, LatestRuns, RunConfigurationStatus, RunReference, RunStatus};
use runfeed_core::{NamespacedName, RunCompletionEvent, RunCompletionStatus};

use super::RunCompletionEventHandler;
use crate::error::{EventError, ResourceError};
use crate::resources::PipelineResources;

const METRIC_STATUS_UPDATES: &str = "runfeed_status_updates";

/// Updates the status of the resources referenced by an event.
///
/// A Run gets its completion state. A RunConfiguration gets its latest succeeded run, so it is
/// only updated for succeeded runs. References without a namespace are skipped.
pub struct StatusUpdater {
    resources: Arc<dyn PipelineResources>,
}

impl StatusUpdater {
    /// Create a new instance.
    pub fn new(resources: Arc<dyn PipelineResources>) -> Self {
        metrics::register_counter!(METRIC_STATUS_UPDATES, metrics::Unit::Count, "status updates of pipeline resources");
        Self { resources }
    }

    /// Update the Run, returning `None` if it was skipped.
    async fn complete_run(&self, name: &NamespacedName, event: &RunCompletionEvent) -> Option<Result<(), ResourceError>> {
        if name.namespace.is_empty() {
            tracing::info!(run_id = %event.run_id, %name, "run name has no namespace, skipping");
            return None;
        }
        let status = RunStatus {
            completion_state: Some(CompletionState::from(event.status)),
        };
        let res = self.resources.patch_run_status(name, &status).await;
        metrics::increment_counter!(METRIC_STATUS_UPDATES, "kind" => "Run", "ok" => if res.is_ok() { "true" } else { "false" });
        Some(res)
    }

    /// Update the RunConfiguration, returning `None` if it was skipped.
    async fn complete_run_configuration(&self, name: &NamespacedName, event: &RunCompletionEvent) -> Option<Result<(), ResourceError>> {
        if event.status != RunCompletionStatus::Succeeded {
            return None;
        }
        if name.namespace.is_empty() {
            tracing::info!(run_id = %event.run_id, %name, "run configuration name has no namespace, skipping");
            return None;
        }
        let status = RunConfigurationStatus {
            latest_runs: LatestRuns {
                succeeded: RunReference {
                    provider_id: event.run_id.clone(),
                    artifacts: event.artifacts.clone(),
                },
            },
        };
        let res = self.resources.patch_run_configuration_status(name, &status).await;
        metrics::increment_counter!(METRIC_STATUS_UPDATES, "kind" => "RunConfiguration", "ok" => if res.is_ok() { "true" } else { "false" });
        Some(res)
    }
}

#[async_trait]
impl RunCompletionEventHandler for StatusUpdater {
    fn name(&self) -> &'static str {
        "status-updater"
    }

    #[tracing::instrument(level = "debug", skip(self, event), fields(run_id = %event.run_id))]
    async fn handle(&self, event: &RunCompletionEvent) -> Result<(), EventError> {
        let mut results = vec![];
        if let Some(name) = event.run_name.as_ref().filter(|name| !name.is_empty()) {
            results.extend(self.complete_run(name, event).await);
        }
        if let Some(name) = event.run_configuration_name.as_ref().filter(|name| !name.is_empty()) {
            results.extend(self.complete_run_configuration(name, event).await);
        }
        aggregate(results)
    }
}

/// Combine the results of the attempted updates.
///
/// Missing resources only fail the event when every attempted update hit a missing resource,
/// any other error fails it outright.
fn aggregate(results: Vec<Result<(), ResourceError>>) -> Result<(), EventError> {
    let attempted = results.len();
    let mut missing = vec![];
    for res in results {
        match res {
            Ok(()) => (),
            Err(err) if err.is_not_found() => {
                tracing::info!(error = %err, "referenced resource not found");
                missing.push(err.to_string());
            }
            Err(err) => return Err(EventError::from(err)),
        }
    }
    if attempted > 0 && missing.len() == attempted {
        return Err(EventError::MissingResource(missing.join(", ")));
    }
    Ok(())
}

#[cfg(test)]
mod mod_test;
