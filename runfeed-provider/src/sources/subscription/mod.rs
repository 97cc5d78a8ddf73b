//! A pull subscriber of pipeline job log entries.
//!
//! Each message is a JSON log entry emitted for a managed pipeline job. The job id is taken from
//! the entry's resource labels. Acknowledging a message removes it from the subscription, while a
//! negative acknowledgement makes it eligible for redelivery until the subscription's dead letter
//! policy takes over.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::providers::RawEvent;
use crate::stream::{Acknowledge, MessageTx, Outcome, StreamMessage};
use runfeed_core::labels;

const METRIC_SUBSCRIPTION_ERRORS: &str = "runfeed_subscription_errors";
const METRIC_SUBSCRIPTION_MALFORMED: &str = "runfeed_subscription_malformed_messages";
const PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com/v1";
const PUBSUB_SCOPES: &[&str] = &["https://www.googleapis.com/auth/pubsub"];
/// Messages are pulled one at a time, so none waits on stage backpressure past its ack deadline.
const MAX_MESSAGES: usize = 1;

/// A message received from a subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub message_id: String,
    pub data: Vec<u8>,
}

/// A pull based message subscription.
#[async_trait]
pub trait Subscription: Send + Sync + 'static {
    /// Pull up to `max` messages, returning an empty batch if none are available.
    async fn pull(&self, max: usize) -> Result<Vec<ReceivedMessage>>;
    /// Acknowledge a message, removing it from the subscription.
    async fn ack(&self, ack_id: &str) -> Result<()>;
    /// Negatively acknowledge a message, making it available for redelivery.
    async fn nack(&self, ack_id: &str) -> Result<()>;
}

/// A source of pipeline job ids read from a subscription.
pub struct SubscriptionSource {
    subscription: Arc<dyn Subscription>,
    /// The delay between pulls which returned no messages.
    poll_interval: Duration,
    /// The channel to emit job ids on.
    out: MessageTx<RawEvent>,
    /// A channel used for triggering graceful shutdown.
    shutdown: BroadcastStream<()>,
}

impl SubscriptionSource {
    /// Create a new instance.
    pub fn new(subscription: Arc<dyn Subscription>, poll_interval: Duration, out: MessageTx<RawEvent>, shutdown: broadcast::Receiver<()>) -> Self {
        metrics::register_counter!(METRIC_SUBSCRIPTION_ERRORS, metrics::Unit::Count, "errors pulling from the subscription");
        metrics::register_counter!(METRIC_SUBSCRIPTION_MALFORMED, metrics::Unit::Count, "malformed messages received from the subscription");
        Self {
            subscription,
            poll_interval,
            out,
            shutdown: BroadcastStream::new(shutdown),
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        tracing::info!("subscription source initialized");
        loop {
            let res = tokio::select! {
                res = self.subscription.pull(MAX_MESSAGES) => res,
                _ = self.shutdown.next() => break,
            };
            let received = match res {
                Ok(received) => received,
                Err(err) => {
                    tracing::error!(error = ?err, "error pulling from subscription");
                    metrics::increment_counter!(METRIC_SUBSCRIPTION_ERRORS);
                    if self.sleep(Duration::from_secs(10)).await {
                        break;
                    }
                    continue;
                }
            };
            if received.is_empty() {
                if self.sleep(self.poll_interval).await {
                    break;
                }
                continue;
            }
            for msg in received {
                if !self.handle_message(msg).await {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) -> bool {
        super::sleep_or_shutdown(&mut self.shutdown, duration).await
    }

    /// Handle a single received message.
    ///
    /// Returns `false` once no further messages should be processed.
    #[tracing::instrument(level = "debug", skip(self, msg), fields(message_id = %msg.message_id))]
    async fn handle_message(&mut self, msg: ReceivedMessage) -> bool {
        let job_id = match pipeline_job_id(&msg.data) {
            Ok(job_id) => job_id,
            Err(err) => {
                tracing::error!(error = ?err, "malformed subscription message");
                metrics::increment_counter!(METRIC_SUBSCRIPTION_MALFORMED);
                if let Err(err) = self.subscription.nack(&msg.ack_id).await {
                    tracing::error!(error = ?err, "error negatively acknowledging malformed message");
                }
                return true;
            }
        };

        tracing::debug!(%job_id, "emitting pipeline job");
        let ack = SubscriptionAck { subscription: self.subscription.clone(), ack_id: msg.ack_id };
        let msg = StreamMessage::new(RawEvent::PipelineJob(job_id), ack);
        tokio::select! {
            res = self.out.send(msg) => match res {
                Ok(()) => true,
                Err(_) => {
                    tracing::error!("subscription source output channel closed");
                    false
                }
            },
            _ = self.shutdown.next() => false,
        }
    }
}

/// Acknowledges or negatively acknowledges a received message.
struct SubscriptionAck {
    subscription: Arc<dyn Subscription>,
    ack_id: String,
}

#[async_trait]
impl Acknowledge for SubscriptionAck {
    async fn acknowledge(self: Box<Self>, outcome: Outcome) {
        let res = match outcome {
            Outcome::Success => self.subscription.ack(&self.ack_id).await,
            Outcome::RecoverableFailure | Outcome::UnrecoverableFailure => self.subscription.nack(&self.ack_id).await,
        };
        if let Err(err) = res {
            tracing::error!(error = ?err, ?outcome, "error acknowledging subscription message");
        }
    }
}

#[derive(Deserialize)]
struct LogEntry {
    #[serde(default)]
    resource: LogEntryResource,
}

#[derive(Default, Deserialize)]
struct LogEntryResource {
    #[serde(default)]
    labels: HashMap<String, String>,
}

/// Extract the pipeline job id from a log entry payload.
pub fn pipeline_job_id(data: &[u8]) -> Result<String> {
    let entry: LogEntry = serde_json::from_slice(data).context("error decoding log entry")?;
    match entry.resource.labels.get(labels::PIPELINE_JOB_ID) {
        Some(job_id) if !job_id.is_empty() => Ok(job_id.clone()),
        _ => bail!("log entry did not contain resource label {}", labels::PIPELINE_JOB_ID),
    }
}

/// A Google Pub/Sub subscription accessed over its REST API.
pub struct PubSubSubscription {
    client: reqwest::Client,
    auth: Arc<dyn gcp_auth::TokenProvider>,
    /// The full subscription path, `projects/{project}/subscriptions/{name}`.
    subscription: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: usize,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<PubSubReceivedMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PubSubReceivedMessage {
    ack_id: String,
    message: PubSubMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PubSubMessage {
    #[serde(default)]
    data: String,
    #[serde(default)]
    message_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest<'a> {
    ack_ids: Vec<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyAckDeadlineRequest<'a> {
    ack_ids: Vec<&'a str>,
    ack_deadline_seconds: u32,
}

impl PubSubSubscription {
    /// Create a new instance using the ambient GCP credentials.
    pub async fn new(subscription: String) -> Result<Self> {
        let auth = gcp_auth::provider().await.context("error initializing GCP auth")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("error building Pub/Sub HTTP client")?;
        Ok(Self { client, auth, subscription })
    }

    async fn post<B: Serialize>(&self, action: &str, body: &B) -> Result<reqwest::Response> {
        let token = self.auth.token(PUBSUB_SCOPES).await.context("error fetching GCP access token")?;
        let url = format!("{}/{}:{}", PUBSUB_ENDPOINT, self.subscription, action);
        let res = self
            .client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(body)
            .send()
            .await
            .with_context(|| format!("error calling Pub/Sub {}", action))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("Pub/Sub {} returned status {}: {}", action, status, body);
        }
        Ok(res)
    }
}

#[async_trait]
impl Subscription for PubSubSubscription {
    async fn pull(&self, max: usize) -> Result<Vec<ReceivedMessage>> {
        let res = self.post("pull", &PullRequest { max_messages: max }).await?;
        let body: PullResponse = res.json().await.context("error decoding Pub/Sub pull response")?;
        let received = body
            .received_messages
            .into_iter()
            .map(|received| {
                // Undecodable data is passed on empty, so it is rejected as malformed.
                let data = base64::decode(&received.message.data).unwrap_or_else(|err| {
                    tracing::warn!(error = ?err, message_id = %received.message.message_id, "error decoding Pub/Sub message data");
                    Vec::new()
                });
                ReceivedMessage {
                    ack_id: received.ack_id,
                    message_id: received.message.message_id,
                    data,
                }
            })
            .collect();
        Ok(received)
    }

    async fn ack(&self, ack_id: &str) -> Result<()> {
        self.post("acknowledge", &AcknowledgeRequest { ack_ids: vec![ack_id] }).await.map(|_| ())
    }

    async fn nack(&self, ack_id: &str) -> Result<()> {
        let req = ModifyAckDeadlineRequest {
            ack_ids: vec![ack_id],
            ack_deadline_seconds: 0,
        };
        self.post("modifyAckDeadline", &req).await.map(|_| ())
    }
}

#[cfg(test)]
mod mod_test;
