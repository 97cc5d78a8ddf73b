use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, SignalStream};
use tokio_stream::StreamMap;

use crate::config::{Config, ProviderType};
use crate::flow::{error_channel, ConversionFlow};
use crate::providers::RunProvider;
use crate::sink::{ErrorSink, WebhookSink};
use crate::sources::{PubSubSubscription, SubscriptionSource, WorkflowSource};
use crate::stream;

/// The application object wiring source, flow and sinks together.
pub struct App {
    /// The application's runtime config.
    _config: Arc<Config>,

    /// A channel used for triggering graceful shutdown.
    shutdown_tx: broadcast::Sender<()>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,

    /// The join handle of the event source.
    source_handle: JoinHandle<Result<()>>,
    /// The join handle of the conversion flow.
    flow_handle: JoinHandle<Result<()>>,
    /// The join handle of the webhook sink.
    sink_handle: JoinHandle<Result<()>>,
    /// The join handle of the error sink.
    error_sink_handle: JoinHandle<Result<()>>,
}

impl App {
    /// Create a new instance.
    pub async fn new(config: Arc<Config>) -> Result<Self> {
        // App shutdown channel.
        let (shutdown_tx, shutdown_rx) = broadcast::channel(10);

        let provider = Arc::new(RunProvider::from_config(&config).await.context("error building provider backend")?);

        let (source_tx, source_rx) = stream::channel();
        let (flow_tx, flow_rx) = stream::channel();
        let (err_tx, err_rx) = error_channel();

        // Spawn from the sink backwards, so that nothing is emitted before it can be consumed.
        let sink_handle = WebhookSink::new(
            config.operator_webhook.clone(),
            Duration::from_secs(config.webhook_timeout_seconds),
            flow_rx,
            shutdown_tx.subscribe(),
        )?
        .spawn();
        let error_sink_handle = ErrorSink::new(err_rx).spawn();
        let flow_handle = ConversionFlow::new(provider, config.provider_name.clone(), source_rx, flow_tx, err_tx, shutdown_tx.subscribe()).spawn();

        let source_handle = match config.provider_type {
            ProviderType::Kfp => {
                let client = kube::Client::try_default().await.context("error initializing K8s client")?;
                WorkflowSource::new(client, config.namespace.clone(), source_tx, shutdown_tx.subscribe()).spawn()
            }
            ProviderType::Vai => {
                let name = config.pubsub_subscription.clone().context("PUBSUB_SUBSCRIPTION is required for provider type vai")?;
                let subscription = PubSubSubscription::new(name).await.context("error initializing Pub/Sub subscription")?;
                let poll_interval = Duration::from_secs(config.pubsub_poll_seconds);
                SubscriptionSource::new(Arc::new(subscription), poll_interval, source_tx, shutdown_tx.subscribe()).spawn()
            }
        };

        Ok(Self {
            _config: config,
            shutdown_rx: BroadcastStream::new(shutdown_rx),
            shutdown_tx,
            source_handle,
            flow_handle,
            sink_handle,
            error_sink_handle,
        })
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        let mut signals = StreamMap::new();
        signals.insert("sigterm", SignalStream::new(signal(SignalKind::terminate()).context("error building signal stream")?));
        signals.insert("sigint", SignalStream::new(signal(SignalKind::interrupt()).context("error building signal stream")?));

        loop {
            tokio::select! {
                Some((_, sig)) = signals.next() => {
                    tracing::debug!(signal = ?sig, "signal received, beginning graceful shutdown");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = self.shutdown_rx.next() => break,
            }
        }

        // Begin shutdown routine.
        tracing::debug!("provider is shutting down");
        if let Err(err) = self.source_handle.await.context("error joining event source handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down event source");
        }
        if let Err(err) = self.flow_handle.await.context("error joining conversion flow handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down conversion flow");
        }
        if let Err(err) = self.sink_handle.await.context("error joining webhook sink handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down webhook sink");
        }
        if let Err(err) = self.error_sink_handle.await.context("error joining error sink handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down error sink");
        }

        tracing::debug!("provider shutdown complete");
        Ok(())
    }
}
