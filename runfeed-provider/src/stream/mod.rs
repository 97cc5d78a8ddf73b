//! Stream primitives connecting sources, flows and sinks.
//!
//! Every message travelling through the pipeline carries the acknowledgement of the source it
//! originated from. Whichever stage decides the fate of a message completes it with exactly one
//! `Outcome`, and completing consumes the message, so a message can never be acknowledged twice.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Channel capacity between stages.
///
/// A single slot keeps stages in lock-step, so a slow sink applies backpressure all the way
/// back to the source.
pub const STAGE_CHANNEL_CAPACITY: usize = 1;

/// The outcome of processing a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The message was fully processed.
    Success,
    /// Processing failed, but may succeed if retried.
    RecoverableFailure,
    /// Processing failed and can never succeed.
    UnrecoverableFailure,
}

/// A source specific reaction to the outcome of one of its messages.
#[async_trait]
pub trait Acknowledge: Send + 'static {
    /// Report the outcome of the message this acknowledgement belongs to.
    async fn acknowledge(self: Box<Self>, outcome: Outcome);
}

/// The acknowledgement handle of a single message.
pub struct Ack {
    inner: Option<Box<dyn Acknowledge>>,
}

impl Ack {
    /// Create a new instance.
    pub fn new(inner: impl Acknowledge) -> Self {
        Self { inner: Some(Box::new(inner)) }
    }

    /// Report the outcome of the message.
    pub async fn complete(mut self, outcome: Outcome) {
        if let Some(inner) = self.inner.take() {
            inner.acknowledge(outcome).await;
        }
    }
}

impl Drop for Ack {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::warn!("stream message dropped without an outcome");
        }
    }
}

impl std::fmt::Debug for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ack").field("pending", &self.inner.is_some()).finish()
    }
}

/// A payload along with the acknowledgement of the source it came from.
#[derive(Debug)]
pub struct StreamMessage<T> {
    pub payload: T,
    pub ack: Ack,
}

impl<T> StreamMessage<T> {
    /// Create a new instance.
    pub fn new(payload: T, ack: impl Acknowledge) -> Self {
        Self { payload, ack: Ack::new(ack) }
    }

    /// Report the outcome of this message, consuming it.
    pub async fn complete(self, outcome: Outcome) {
        self.ack.complete(outcome).await
    }

    /// Convert the payload, carrying over the same acknowledgement.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StreamMessage<U> {
        StreamMessage { payload: f(self.payload), ack: self.ack }
    }
}

/// The sending half of a channel between two stages.
pub type MessageTx<T> = mpsc::Sender<StreamMessage<T>>;
/// The receiving half of a channel between two stages.
pub type MessageRx<T> = mpsc::Receiver<StreamMessage<T>>;

/// Create a channel for connecting two stages.
pub fn channel<T>() -> (MessageTx<T>, MessageRx<T>) {
    mpsc::channel(STAGE_CHANNEL_CAPACITY)
}

#[cfg(test)]
pub mod fixtures;
