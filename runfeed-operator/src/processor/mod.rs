//! Narrowing of provider events into consumer events.
//!
//! A provider reports every output of a completed run. Only the outputs which the owning Run or
//! RunConfiguration declared are carried on to the handlers, under their declared names.

use std::sync::Arc;

use runfeed_core::crd::OutputArtifact;
use runfeed_core::{Artifact, PipelineComponent, RunCompletionEvent, RunCompletionEventData};

use crate::error::EventError;
use crate::expr::Expr;
use crate::resources::PipelineResources;

/// Converts provider events into consumer events.
pub struct EventProcessor {
    resources: Arc<dyn PipelineResources>,
}

impl EventProcessor {
    /// Create a new instance.
    pub fn new(resources: Arc<dyn PipelineResources>) -> Self {
        Self { resources }
    }

    /// Convert the given event data, reading the declared artifacts of its owning resource.
    #[tracing::instrument(level = "debug", skip(self, data), fields(run_id = %data.run_id))]
    pub async fn to_event(&self, data: RunCompletionEventData) -> Result<RunCompletionEvent, EventError> {
        let declared = self.declared_artifacts(&data).await?;
        let artifacts = filter_artifacts(&data.pipeline_components, &declared);
        Ok(data.into_event(artifacts))
    }

    /// The output artifacts declared by the RunConfiguration of the event if any, else its Run.
    ///
    /// A reference which is not found falls through to the next one. The event is only missing
    /// its resources when every reference looked up was not found. References without a
    /// namespace can not be looked up and are skipped.
    async fn declared_artifacts(&self, data: &RunCompletionEventData) -> Result<Vec<OutputArtifact>, EventError> {
        let rc_name = data.run_configuration_name.as_ref().filter(|name| !name.is_empty());
        let run_name = data.run_name.as_ref().filter(|name| !name.is_empty());
        if rc_name.is_none() && run_name.is_none() {
            return Err(EventError::InvalidEvent("neither a RunConfiguration nor a Run is referenced".into()));
        }

        let mut missing = None;
        if let Some(name) = rc_name.filter(|name| !name.namespace.is_empty()) {
            match self.resources.get_run_configuration(name).await {
                Ok(rc) => return Ok(rc.spec.run.artifacts),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(error = ?err, %name, "RunConfiguration of event not found");
                    missing = Some(err);
                }
                Err(err) => {
                    tracing::warn!(error = ?err, %name, "error loading RunConfiguration of event");
                    return Err(err.into());
                }
            }
        }
        if let Some(name) = run_name.filter(|name| !name.namespace.is_empty()) {
            match self.resources.get_run(name).await {
                Ok(run) => return Ok(run.spec.artifacts),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(error = ?err, %name, "Run of event not found");
                    missing = Some(err);
                }
                Err(err) => {
                    tracing::warn!(error = ?err, %name, "error loading Run of event");
                    return Err(err.into());
                }
            }
        }
        match missing {
            Some(err) => Err(err.into()),
            None => {
                tracing::info!(run_id = %data.run_id, "event references no namespaced resource, no artifacts declared");
                Ok(vec![])
            }
        }
    }
}

/// Select the declared output artifacts from a run's component outputs.
///
/// An artifact is selected when its component and artifact names match the declaration, the
/// declared index exists, its URI is set and its metadata satisfies the declared filter.
/// Declarations with an unparsable filter select nothing, as does a filter which fails to
/// evaluate against an artifact's metadata.
pub fn filter_artifacts(components: &[PipelineComponent], declared: &[OutputArtifact]) -> Vec<Artifact> {
    let mut artifacts = vec![];
    for output in declared {
        let filter = match output.path.filter.as_deref().map(str::parse::<Expr>).transpose() {
            Ok(filter) => filter,
            Err(err) => {
                tracing::warn!(error = ?err, name = %output.name, "skipping output artifact with invalid filter");
                continue;
            }
        };
        let locator = &output.path.locator;
        let candidates = components
            .iter()
            .filter(|component| component.name == locator.component)
            .flat_map(|component| component.component_artifacts.iter())
            .filter(|artifact| artifact.name == locator.artifact)
            .filter_map(|artifact| artifact.artifacts.get(locator.index))
            .filter(|instance| !instance.uri.is_empty());
        for instance in candidates {
            if let Some(filter) = filter.as_ref() {
                match filter.evaluate(&instance.metadata) {
                    Ok(true) => (),
                    Ok(false) => continue,
                    Err(err) => {
                        tracing::debug!(error = ?err, name = %output.name, "artifact filter did not evaluate");
                        continue;
                    }
                }
            }
            artifacts.push(Artifact {
                name: output.name.clone(),
                location: instance.uri.clone(),
            });
        }
    }
    artifacts
}

#[cfg(test)]
mod mod_test;
