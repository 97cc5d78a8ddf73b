//! Sinks terminating the pipeline.
//!
//! The webhook sink delivers completion events to the operator's run completion feed and
//! completes each message according to the feed's response. The error sink drains the errors
//! emitted by the conversion flow.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::flow::ErrorRx;
use crate::stream::{MessageRx, Outcome};
use runfeed_core::RunCompletionEventData;

const METRIC_WEBHOOK_DELIVERIES: &str = "runfeed_webhook_deliveries";
const METRIC_PROVIDER_ERRORS: &str = "runfeed_provider_errors";

/// Classify a feed response status.
///
/// A gone resource can never be updated, every other failure may succeed on retry.
pub fn classify(status: StatusCode) -> Outcome {
    match status {
        StatusCode::OK => Outcome::Success,
        StatusCode::GONE => Outcome::UnrecoverableFailure,
        _ => Outcome::RecoverableFailure,
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "success",
        Outcome::RecoverableFailure => "recoverable",
        Outcome::UnrecoverableFailure => "unrecoverable",
    }
}

/// A sink POSTing completion events to the operator.
pub struct WebhookSink {
    client: reqwest::Client,
    /// The URL of the run completion feed.
    url: String,
    /// The channel of events to deliver.
    input: MessageRx<RunCompletionEventData>,
    /// A channel used for triggering graceful shutdown.
    shutdown: BroadcastStream<()>,
}

impl WebhookSink {
    /// Create a new instance.
    pub fn new(url: String, timeout: Duration, input: MessageRx<RunCompletionEventData>, shutdown: broadcast::Receiver<()>) -> Result<Self> {
        metrics::register_counter!(METRIC_WEBHOOK_DELIVERIES, metrics::Unit::Count, "completion event deliveries by outcome");
        let client = reqwest::Client::builder().timeout(timeout).build().context("error building webhook HTTP client")?;
        Ok(Self {
            client,
            url,
            input,
            shutdown: BroadcastStream::new(shutdown),
        })
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        tracing::info!(url = %self.url, "webhook sink initialized");
        loop {
            let msg = tokio::select! {
                msg_opt = self.input.recv() => match msg_opt {
                    Some(msg) => msg,
                    None => break,
                },
                _ = self.shutdown.next() => break,
            };
            let outcome = self.deliver(&msg.payload).await;
            metrics::increment_counter!(METRIC_WEBHOOK_DELIVERIES, "outcome" => outcome_label(outcome));
            msg.complete(outcome).await;
        }
        tracing::debug!("webhook sink shutdown");
        Ok(())
    }

    /// Deliver a single event, returning the outcome of the delivery.
    #[tracing::instrument(level = "debug", skip(self, event), fields(run_id = %event.run_id))]
    async fn deliver(&self, event: &RunCompletionEventData) -> Outcome {
        match self.client.post(&self.url).json(event).send().await {
            Ok(res) => {
                let outcome = classify(res.status());
                if outcome != Outcome::Success {
                    tracing::warn!(status = %res.status(), ?outcome, "completion event rejected by feed");
                }
                outcome
            }
            Err(err) => {
                tracing::error!(error = ?err, "error delivering completion event");
                Outcome::RecoverableFailure
            }
        }
    }
}

/// A sink logging the errors of the conversion flow.
///
/// Errors are logged here only, once per failed message.
pub struct ErrorSink {
    input: ErrorRx,
}

impl ErrorSink {
    /// Create a new instance.
    pub fn new(input: ErrorRx) -> Self {
        metrics::register_counter!(METRIC_PROVIDER_ERRORS, metrics::Unit::Count, "errors emitted by the conversion flow");
        Self { input }
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Drain errors until the flow closes its error channel.
    async fn run(mut self) -> Result<()> {
        while let Some(err) = self.input.recv().await {
            metrics::increment_counter!(METRIC_PROVIDER_ERRORS);
            tracing::error!(error = ?err, outcome = ?err.outcome(), "error converting raw event");
        }
        Ok(())
    }
}
