//! Fakes of the KFP APIs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kube::core::DynamicObject;
use serde_json::json;

use super::*;

/// A KFP API serving canned runs and jobs.
#[derive(Default)]
pub struct FakeKfpApi {
    pub runs: HashMap<String, ApiRun>,
    pub jobs: HashMap<String, ApiJob>,
    pub job_requests: Mutex<Vec<String>>,
}

#[async_trait]
impl KfpApi for FakeKfpApi {
    async fn get_run(&self, run_id: &str) -> Result<ApiRun, ProviderError> {
        self.runs.get(run_id).cloned().ok_or_else(|| ProviderError::NotFound(run_id.into()))
    }

    async fn get_job(&self, job_id: &str) -> Result<ApiJob, ProviderError> {
        if let Ok(mut requests) = self.job_requests.lock() {
            requests.push(job_id.into());
        }
        self.jobs.get(job_id).cloned().ok_or_else(|| ProviderError::NotFound(job_id.into()))
    }
}

/// A metadata store serving canned artifacts, or failing every query.
#[derive(Default)]
pub struct FakeMetadataStore {
    pub serving: HashMap<String, Vec<Artifact>>,
    pub components: HashMap<String, Vec<PipelineComponent>>,
    pub unavailable: bool,
}

#[async_trait]
impl MetadataStore for FakeMetadataStore {
    async fn serving_artifacts(&self, workflow_name: &str) -> Result<Vec<Artifact>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Api("metadata store unavailable".into()));
        }
        Ok(self.serving.get(workflow_name).cloned().unwrap_or_default())
    }

    async fn artifacts_for_run(&self, run_id: &str) -> Result<Vec<PipelineComponent>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Api("metadata store unavailable".into()));
        }
        Ok(self.components.get(run_id).cloned().unwrap_or_default())
    }
}

/// Build an Argo workflow with the given name, run id and phase.
pub fn workflow(name: &str, run_id: &str, phase: &str) -> DynamicObject {
    let doc = json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Workflow",
        "metadata": {
            "name": name,
            "namespace": "kubeflow",
            "labels": {
                "pipeline/runid": run_id,
                "workflows.argoproj.io/phase": phase,
            },
            "annotations": {
                "pipelines.kubeflow.org/pipeline_spec": r#"{"name":"pipeline-from-spec"}"#,
            },
        },
        "spec": {"entrypoint": "entrypoint-pipeline"},
        "status": {
            "startedAt": "2022-03-01T10:00:00Z",
            "finishedAt": "2022-03-01T11:00:00Z",
        },
    });
    serde_json::from_value(doc).expect("valid workflow document")
}
