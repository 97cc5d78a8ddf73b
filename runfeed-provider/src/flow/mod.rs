//! The conversion flow.
//!
//! Consumes raw completion signals, converts them into completion events via the configured
//! provider, and emits them downstream with the acknowledgement of the originating message.
//! Conversion errors complete the message with the outcome the error calls for and are also
//! emitted on the error channel.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::ProviderError;
use crate::providers::{RawEvent, RunProvider};
use crate::stream::{MessageRx, MessageTx, Outcome, StreamMessage};
use runfeed_core::RunCompletionEventData;

const METRIC_FLOW_CONVERSION_ERRORS: &str = "runfeed_flow_conversion_errors";
const METRIC_FLOW_UNFINISHED_RUNS: &str = "runfeed_flow_unfinished_runs";

/// The sending half of an error channel.
pub type ErrorTx = mpsc::Sender<ProviderError>;
/// The receiving half of an error channel.
pub type ErrorRx = mpsc::Receiver<ProviderError>;

/// Create an error channel.
pub fn error_channel() -> (ErrorTx, ErrorRx) {
    mpsc::channel(crate::stream::STAGE_CHANNEL_CAPACITY)
}

/// A flow converting raw events into completion events.
pub struct ConversionFlow {
    /// The provider backend used for conversion.
    provider: Arc<RunProvider>,
    /// The provider name stamped onto every event.
    provider_name: String,
    /// The channel of incoming raw events.
    input: MessageRx<RawEvent>,
    /// The channel to emit completion events on.
    out: MessageTx<RunCompletionEventData>,
    /// The channel to emit conversion errors on.
    err_out: ErrorTx,
    /// A channel used for triggering graceful shutdown.
    shutdown: BroadcastStream<()>,
}

impl ConversionFlow {
    /// Create a new instance.
    pub fn new(
        provider: Arc<RunProvider>, provider_name: String, input: MessageRx<RawEvent>, out: MessageTx<RunCompletionEventData>, err_out: ErrorTx,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        metrics::register_counter!(METRIC_FLOW_CONVERSION_ERRORS, metrics::Unit::Count, "errors converting raw events into completion events");
        metrics::register_counter!(METRIC_FLOW_UNFINISHED_RUNS, metrics::Unit::Count, "raw events of runs which have not finished");
        Self {
            provider,
            provider_name,
            input,
            out,
            err_out,
            shutdown: BroadcastStream::new(shutdown),
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        tracing::info!(provider = %self.provider_name, "conversion flow initialized");
        loop {
            let msg = tokio::select! {
                msg_opt = self.input.recv() => match msg_opt {
                    Some(msg) => msg,
                    None => break,
                },
                _ = self.shutdown.next() => break,
            };
            if !self.handle_message(msg).await {
                break;
            }
        }
        tracing::debug!("conversion flow shutdown");
        Ok(())
    }

    /// Convert a single message and route the result.
    ///
    /// Returns `false` once no further messages should be processed.
    #[tracing::instrument(level = "debug", skip(self, msg))]
    async fn handle_message(&mut self, msg: StreamMessage<RawEvent>) -> bool {
        match self.provider.convert(&self.provider_name, &msg.payload).await {
            Ok(Some(data)) => {
                tracing::debug!(run_id = %data.run_id, status = %data.status, "emitting completion event");
                let out = msg.map(|_| data);
                tokio::select! {
                    res = self.out.send(out) => match res {
                        Ok(()) => true,
                        Err(_) => {
                            tracing::error!("conversion flow output channel closed");
                            false
                        }
                    },
                    _ = self.shutdown.next() => false,
                }
            }
            Ok(None) => {
                // Workflows are emitted again on their next update, subscription messages are
                // redelivered.
                metrics::increment_counter!(METRIC_FLOW_UNFINISHED_RUNS);
                msg.complete(Outcome::RecoverableFailure).await;
                true
            }
            Err(err) => {
                metrics::increment_counter!(METRIC_FLOW_CONVERSION_ERRORS);
                msg.complete(err.outcome()).await;
                tokio::select! {
                    res = self.err_out.send(err) => res.is_ok(),
                    _ = self.shutdown.next() => false,
                }
            }
        }
    }
}
