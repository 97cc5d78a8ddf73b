use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, SignalStream};
use tokio_stream::StreamMap;

use crate::config::Config;
use crate::handlers::{RunCompletionEventHandler, StatusUpdater, TriggerForwarder};
use crate::processor::EventProcessor;
use crate::resources::{KubeResources, PipelineResources};
use crate::server::{spawn_feed_server, RunCompletionFeed};

/// The application object for when the operator's feed is running.
pub struct App {
    /// The application's runtime config.
    _config: Arc<Config>,

    /// A channel used for triggering graceful shutdown.
    shutdown_tx: broadcast::Sender<()>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,

    /// The join handle of the feed server.
    server: JoinHandle<Result<()>>,
}

impl App {
    /// Create a new instance.
    pub async fn new(config: Arc<Config>) -> Result<Self> {
        // App shutdown channel.
        let (shutdown_tx, shutdown_rx) = broadcast::channel(10);

        // Initialize K8s client.
        let client = kube::Client::try_default().await.context("error initializing K8s client")?;
        let resources: Arc<dyn PipelineResources> = Arc::new(KubeResources::new(client, Duration::from_secs(config.k8s_timeout_seconds)));

        let mut handlers: Vec<Arc<dyn RunCompletionEventHandler>> = vec![Arc::new(StatusUpdater::new(resources.clone()))];
        if let Some(url) = config.trigger_service_url.as_deref() {
            let forwarder = TriggerForwarder::new(url, Duration::from_secs(config.trigger_timeout_seconds)).context("error building trigger forwarder")?;
            handlers.push(Arc::new(forwarder));
        }
        let feed = Arc::new(RunCompletionFeed::new(EventProcessor::new(resources), handlers));

        let (_addr, server) = spawn_feed_server(([0, 0, 0, 0], config.http_port).into(), feed, shutdown_tx.subscribe())?;

        Ok(Self {
            _config: config,
            shutdown_rx: BroadcastStream::new(shutdown_rx),
            shutdown_tx,
            server,
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
        tracing::debug!("operator is shutting down");
        if let Err(err) = self.server.await.context("error joining feed server handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down feed server");
        }

        tracing::debug!("operator shutdown complete");
        Ok(())
    }
}
