//! Test fixtures shared across the operator's tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use runfeed_core::crd::{OutputArtifact, Run, RunConfiguration, RunConfigurationSpec, RunConfigurationStatus, RunSpec, RunStatus};
use runfeed_core::{Artifact, NamespacedName, RunCompletionEvent, RunCompletionEventData, RunCompletionStatus};

use crate::error::{EventError, ResourceError};
use crate::handlers::RunCompletionEventHandler;
use crate::resources::PipelineResources;

/// In-memory pipeline resources recording status patches.
#[derive(Default)]
pub struct FakeResources {
    pub runs: HashMap<NamespacedName, Run>,
    pub run_configurations: HashMap<NamespacedName, RunConfiguration>,
    /// Fail every call with an API error.
    pub unavailable: bool,
    pub run_patches: Mutex<Vec<(NamespacedName, RunStatus)>>,
    pub run_configuration_patches: Mutex<Vec<(NamespacedName, RunConfigurationStatus)>>,
}

impl FakeResources {
    pub fn with_run(mut self, name: &NamespacedName, artifacts: Vec<OutputArtifact>) -> Self {
        let mut run = Run::new(&name.name, RunSpec { artifacts, ..Default::default() });
        run.metadata.namespace = Some(name.namespace.clone());
        self.runs.insert(name.clone(), run);
        self
    }

    pub fn with_run_configuration(mut self, name: &NamespacedName, artifacts: Vec<OutputArtifact>) -> Self {
        let spec = RunConfigurationSpec {
            run: RunSpec { artifacts, ..Default::default() },
        };
        let mut rc = RunConfiguration::new(&name.name, spec);
        rc.metadata.namespace = Some(name.namespace.clone());
        self.run_configurations.insert(name.clone(), rc);
        self
    }

    pub fn run_patches(&self) -> Vec<(NamespacedName, RunStatus)> {
        self.run_patches.lock().map(|patches| patches.clone()).unwrap_or_default()
    }

    pub fn run_configuration_patches(&self) -> Vec<(NamespacedName, RunConfigurationStatus)> {
        self.run_configuration_patches.lock().map(|patches| patches.clone()).unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), ResourceError> {
        if self.unavailable {
            return Err(ResourceError::Timeout("fake resources".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineResources for FakeResources {
    async fn get_run(&self, name: &NamespacedName) -> Result<Run, ResourceError> {
        self.check_available()?;
        self.runs.get(name).cloned().ok_or_else(|| ResourceError::NotFound(format!("Run {}", name)))
    }

    async fn get_run_configuration(&self, name: &NamespacedName) -> Result<RunConfiguration, ResourceError> {
        self.check_available()?;
        self.run_configurations
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(format!("RunConfiguration {}", name)))
    }

    async fn patch_run_status(&self, name: &NamespacedName, status: &RunStatus) -> Result<(), ResourceError> {
        self.get_run(name).await?;
        if let Ok(mut patches) = self.run_patches.lock() {
            patches.push((name.clone(), status.clone()));
        }
        Ok(())
    }

    async fn patch_run_configuration_status(&self, name: &NamespacedName, status: &RunConfigurationStatus) -> Result<(), ResourceError> {
        self.get_run_configuration(name).await?;
        if let Ok(mut patches) = self.run_configuration_patches.lock() {
            patches.push((name.clone(), status.clone()));
        }
        Ok(())
    }
}

/// A handler returning a fixed result and recording the events it received.
pub struct RecordingHandler {
    pub result: Result<(), EventError>,
    pub received: Mutex<Vec<RunCompletionEvent>>,
}

impl RecordingHandler {
    pub fn new(result: Result<(), EventError>) -> Self {
        Self {
            result,
            received: Mutex::new(vec![]),
        }
    }

    pub fn received(&self) -> Vec<RunCompletionEvent> {
        self.received.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RunCompletionEventHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn handle(&self, event: &RunCompletionEvent) -> Result<(), EventError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(event.clone());
        }
        self.result.clone()
    }
}

/// Event data for a succeeded run of the given resources.
pub fn event_data(run_configuration_name: Option<NamespacedName>, run_name: Option<NamespacedName>) -> RunCompletionEventData {
    RunCompletionEventData {
        status: RunCompletionStatus::Succeeded,
        pipeline_name: NamespacedName::new("ns", "pipeline"),
        run_configuration_name,
        run_name,
        run_id: "marker".into(),
        run_start_time: None,
        run_end_time: None,
        serving_model_artifacts: vec![Artifact {
            name: "serving-model".into(),
            location: "gs://models/pushed".into(),
        }],
        pipeline_components: vec![],
        provider: "kfp-provider".into(),
    }
}

/// An event of a succeeded run of the given resources.
pub fn event(run_configuration_name: Option<NamespacedName>, run_name: Option<NamespacedName>) -> RunCompletionEvent {
    event_data(run_configuration_name, run_name).into_event(vec![])
}
