//! Forwards run completion events to the event trigger service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use runfeed_core::{Artifact, NamespacedName, RunCompletionEvent, RunCompletionStatus};
use tonic::transport::{Channel, Endpoint};

use super::RunCompletionEventHandler;
use crate::error::EventError;
use crate::grpc::{self, RunCompletionEventTriggerClient};

const METRIC_TRIGGER_ERRORS: &str = "runfeed_trigger_errors";

/// Publishes each event to the trigger service over gRPC.
pub struct TriggerForwarder {
    client: RunCompletionEventTriggerClient<Channel>,
}

impl TriggerForwarder {
    /// Create a new instance, connecting lazily to the given URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        metrics::register_counter!(METRIC_TRIGGER_ERRORS, metrics::Unit::Count, "errors forwarding events to the trigger service");
        let endpoint = Endpoint::from_shared(url.to_string())
            .context("invalid trigger service URL")?
            .timeout(timeout)
            .connect_timeout(timeout);
        tracing::info!(%url, "forwarding run completion events to trigger service");
        Ok(Self {
            client: RunCompletionEventTriggerClient::new(endpoint.connect_lazy()),
        })
    }
}

#[async_trait]
impl RunCompletionEventHandler for TriggerForwarder {
    fn name(&self) -> &'static str {
        "trigger-forwarder"
    }

    #[tracing::instrument(level = "debug", skip(self, event), fields(run_id = %event.run_id))]
    async fn handle(&self, event: &RunCompletionEvent) -> Result<(), EventError> {
        let req = to_proto(event)?;
        // The channel is shared, each call only needs its own handle.
        let mut client = self.client.clone();
        client.process_event_feed(req).await.map(|_| ()).map_err(|status| {
            metrics::increment_counter!(METRIC_TRIGGER_ERRORS);
            EventError::Fatal(format!("error forwarding event to trigger service: {}", status))
        })
    }
}

/// Convert an event into its wire form, flattening names into `namespace/name` strings.
pub fn to_proto(event: &RunCompletionEvent) -> Result<grpc::RunCompletionEvent, EventError> {
    Ok(grpc::RunCompletionEvent {
        status: match event.status {
            RunCompletionStatus::Succeeded => grpc::Status::Succeeded as i32,
            RunCompletionStatus::Failed => grpc::Status::Failed as i32,
        },
        pipeline_name: name_to_proto("pipeline", &event.pipeline_name)?,
        run_configuration_name: event
            .run_configuration_name
            .as_ref()
            .map(|name| name_to_proto("run configuration", name))
            .transpose()?
            .unwrap_or_default(),
        run_name: event.run_name.as_ref().map(|name| name_to_proto("run", name)).transpose()?.unwrap_or_default(),
        run_id: event.run_id.clone(),
        serving_model_artifacts: artifacts_to_proto(&event.serving_model_artifacts),
        artifacts: artifacts_to_proto(&event.artifacts),
        provider: event.provider.clone(),
    })
}

fn name_to_proto(what: &str, name: &NamespacedName) -> Result<String, EventError> {
    name.try_to_string()
        .map_err(|err| EventError::InvalidEvent(format!("error formatting {} name: {}", what, err)))
}

fn artifacts_to_proto(artifacts: &[Artifact]) -> Vec<grpc::Artifact> {
    artifacts
        .iter()
        .map(|artifact| grpc::Artifact {
            name: artifact.name.clone(),
            location: artifact.location.clone(),
        })
        .collect()
}
