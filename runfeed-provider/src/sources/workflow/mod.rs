//! A K8s watcher of Argo workflows belonging to provider runs.
//!
//! Workflows are watched with a label selector which excludes any workflow already carrying
//! the events-published marker. Once a workflow's completion event has been delivered, the
//! marker is patched onto it, so a re-list after a restart will not emit it again.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::StreamExt;
use json_patch::{AddOperation, PatchOperation};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::client::Client;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::runtime::watcher::{watcher, Error as WatcherError, Event};
use kube::ResourceExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::providers::RawEvent;
use crate::stream::{Acknowledge, MessageTx, Outcome, StreamMessage};
use runfeed_core::labels;

const METRIC_WORKFLOW_WATCHER_ERRORS: &str = "runfeed_workflow_watcher_errors";
const WATCH_ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// A result type used for workflow events coming from K8s.
pub type WorkflowEventResult = std::result::Result<Event<DynamicObject>, WatcherError>;

/// The API resource of Argo workflows.
pub fn workflow_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("argoproj.io", "v1alpha1", "Workflow"))
}

/// A K8s event watcher of unpublished workflows.
pub struct WorkflowSource {
    /// K8s client.
    client: Client,
    /// The namespace to watch, or empty for all namespaces.
    namespace: String,
    /// The channel to emit workflows on.
    out: MessageTx<RawEvent>,
    /// A channel used for triggering graceful shutdown.
    shutdown: BroadcastStream<()>,
}

impl WorkflowSource {
    /// Create a new instance.
    pub fn new(client: Client, namespace: String, out: MessageTx<RawEvent>, shutdown: broadcast::Receiver<()>) -> Self {
        metrics::register_counter!(METRIC_WORKFLOW_WATCHER_ERRORS, metrics::Unit::Count, "k8s watcher errors from the workflow source");
        Self {
            client,
            namespace,
            out,
            shutdown: BroadcastStream::new(shutdown),
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        let resource = workflow_resource();
        let api: Api<DynamicObject> = if self.namespace.is_empty() {
            Api::all_with(self.client.clone(), &resource)
        } else {
            Api::namespaced_with(self.client.clone(), &self.namespace, &resource)
        };
        let stream = watcher(api, ListParams::default().labels(labels::UNPUBLISHED_WORKFLOW_SELECTOR));
        tokio::pin!(stream);

        tracing::info!(namespace = %self.namespace, "workflow source initialized");
        loop {
            tokio::select! {
                Some(k8s_event_res) = stream.next() => {
                    if !self.handle_k8s_event(k8s_event_res).await {
                        break;
                    }
                }
                _ = self.shutdown.next() => break,
            }
        }

        Ok(())
    }

    /// Handle watcher events coming from K8s.
    ///
    /// Returns `false` once no further events should be processed.
    #[tracing::instrument(level = "debug", skip(self, res))]
    async fn handle_k8s_event(&mut self, res: WorkflowEventResult) -> bool {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(error = ?err, "error from k8s watch stream");
                metrics::increment_counter!(METRIC_WORKFLOW_WATCHER_ERRORS);
                return !super::sleep_or_shutdown(&mut self.shutdown, WATCH_ERROR_BACKOFF).await;
            }
        };
        match event {
            Event::Applied(workflow) => self.emit(workflow).await,
            Event::Deleted(_workflow) => true,
            Event::Restarted(workflows) => {
                tracing::debug!(len = workflows.len(), "workflow watcher restarted");
                for workflow in workflows {
                    if !self.emit(workflow).await {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Emit the given workflow downstream, blocking until it is accepted or shutdown begins.
    async fn emit(&mut self, workflow: DynamicObject) -> bool {
        if !is_unpublished(workflow.labels()) {
            return true;
        }
        let ack = WorkflowAck {
            client: self.client.clone(),
            name: workflow.name(),
            namespace: workflow.namespace().unwrap_or_default(),
        };
        tracing::debug!(name = %ack.name, namespace = %ack.namespace, "emitting workflow");
        let msg = StreamMessage::new(RawEvent::Workflow(workflow), ack);
        tokio::select! {
            res = self.out.send(msg) => match res {
                Ok(()) => true,
                Err(_) => {
                    tracing::error!("workflow source output channel closed");
                    false
                }
            },
            _ = self.shutdown.next() => false,
        }
    }
}

/// Marks a workflow as published once its event has been delivered.
struct WorkflowAck {
    client: Client,
    name: String,
    namespace: String,
}

#[async_trait]
impl Acknowledge for WorkflowAck {
    async fn acknowledge(self: Box<Self>, outcome: Outcome) {
        match outcome {
            Outcome::Success => (),
            // A watch event can not be redelivered. The marker stays unset, so the workflow is
            // emitted again on its next update or on the next re-list.
            Outcome::RecoverableFailure | Outcome::UnrecoverableFailure => {
                tracing::debug!(name = %self.name, ?outcome, "leaving workflow unpublished");
                return;
            }
        }
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), &self.namespace, &workflow_resource());
        let patch: Patch<()> = Patch::Json(published_patch());
        match api.patch(&self.name, &PatchParams::apply(runfeed_core::APP_NAME), &patch).await {
            Ok(_) => tracing::debug!(name = %self.name, namespace = %self.namespace, "workflow marked as published"),
            Err(err) => tracing::error!(error = ?err, name = %self.name, namespace = %self.namespace, "error marking workflow as published"),
        }
    }
}

/// Check the watch predicate against a workflow's labels.
pub fn is_unpublished(workflow_labels: &BTreeMap<String, String>) -> bool {
    workflow_labels.contains_key(labels::PIPELINE_RUN_ID) && workflow_labels.get(labels::EVENTS_PUBLISHED).map(|val| val != "true").unwrap_or(true)
}

/// The JSON patch setting the events-published marker.
pub fn published_patch() -> json_patch::Patch {
    json_patch::Patch(vec![PatchOperation::Add(AddOperation {
        path: format!("/metadata/labels/{}", escape_json_pointer(labels::EVENTS_PUBLISHED)),
        value: serde_json::Value::String("true".into()),
    })])
}

/// Escape a JSON pointer reference token.
pub fn escape_json_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
