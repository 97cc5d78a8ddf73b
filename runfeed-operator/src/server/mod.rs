//! The run completion feed.
//!
//! Providers POST completed runs to `/events`. Each event is narrowed to the artifacts its
//! owning resource declared and handed to every registered handler. The response status tells
//! the provider how to proceed: 200 once handled, 410 when a referenced resource is gone, 400
//! for events which can never be processed and 500 for anything worth retrying.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::Extension;
use axum::handler::Handler;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{AddExtensionLayer, Router};
use futures::prelude::*;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::error::EventError;
use crate::handlers::RunCompletionEventHandler;
use crate::processor::EventProcessor;
use runfeed_core::RunCompletionEventData;

const METRIC_FEED_EVENTS: &str = "runfeed_feed_events";
const CONTENT_TYPE_JSON: &str = "application/json";

/// Dispatches received events to the registered handlers.
pub struct RunCompletionFeed {
    processor: EventProcessor,
    handlers: Vec<Arc<dyn RunCompletionEventHandler>>,
}

impl RunCompletionFeed {
    /// Create a new instance.
    pub fn new(processor: EventProcessor, handlers: Vec<Arc<dyn RunCompletionEventHandler>>) -> Self {
        metrics::register_counter!(METRIC_FEED_EVENTS, metrics::Unit::Count, "run completion events received by the feed");
        Self { processor, handlers }
    }

    /// Process a received request, returning the response status and message.
    pub async fn receive(&self, content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let (status, msg) = match self.receive_inner(content_type, body).await {
            Ok(()) => (StatusCode::OK, String::new()),
            Err((status, msg)) => (status, msg),
        };
        metrics::increment_counter!(METRIC_FEED_EVENTS, "status" => status.as_u16().to_string());
        (status, msg)
    }

    async fn receive_inner(&self, content_type: Option<&str>, body: &str) -> std::result::Result<(), (StatusCode, String)> {
        if !is_json(content_type) {
            tracing::error!(content_type = ?content_type, "invalid content type received by feed");
            return Err((StatusCode::UNSUPPORTED_MEDIA_TYPE, format!("invalid content type, want `{}`", CONTENT_TYPE_JSON)));
        }
        if body.trim().is_empty() {
            tracing::error!("empty request body received by feed");
            return Err((StatusCode::BAD_REQUEST, "request body is empty".into()));
        }
        let data: RunCompletionEventData = serde_json::from_str(body).map_err(|err| {
            tracing::error!(error = ?err, "error decoding run completion event");
            (StatusCode::BAD_REQUEST, format!("error decoding run completion event: {}", err))
        })?;
        validate(&data).map_err(reject)?;

        let event = self.processor.to_event(data).await.map_err(reject)?;
        let mut errors = vec![];
        for handler in self.handlers.iter() {
            if let Err(err) = handler.handle(&event).await {
                tracing::error!(error = %err, handler = handler.name(), run_id = %event.run_id, "run completion event handler failed");
                errors.push(err);
            }
        }
        match EventError::most_severe(errors) {
            Some(err) => Err(reject(err)),
            None => {
                tracing::info!(run_id = %event.run_id, status = %event.status, "run completion event handled");
                Ok(())
            }
        }
    }
}

/// Reject events which do not identify a run or the resources it belongs to.
pub fn validate(data: &RunCompletionEventData) -> std::result::Result<(), EventError> {
    if data.run_id.is_empty() {
        return Err(EventError::InvalidEvent("event has no run id".into()));
    }
    let has_run_configuration = data.run_configuration_name.as_ref().map(|name| !name.is_empty()).unwrap_or(false);
    let has_run = data.run_name.as_ref().map(|name| !name.is_empty()).unwrap_or(false);
    if !has_run_configuration && !has_run {
        return Err(EventError::InvalidEvent("event references neither a run configuration nor a run".into()));
    }
    Ok(())
}

fn reject(err: EventError) -> (StatusCode, String) {
    (err.status_code(), err.to_string())
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|val| val.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(CONTENT_TYPE_JSON))
        .unwrap_or(false)
}

/// Spawn the feed's HTTP server, returning the address it is bound to.
pub fn spawn_feed_server(addr: SocketAddr, feed: Arc<RunCompletionFeed>, mut shutdown: broadcast::Receiver<()>) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/events", post(handle_event.layer(TraceLayer::new_for_http())))
        .layer(AddExtensionLayer::new(feed));
    let server = axum::Server::try_bind(&addr)
        .context("error binding socket address for feed server")?
        .serve(app.into_make_service());
    let local_addr = server.local_addr();
    let server = server.with_graceful_shutdown(async move {
        let _res = shutdown.recv().await;
    });
    tracing::info!("run completion feed is listening at {}/events", local_addr);
    Ok((local_addr, tokio::spawn(server.map_err(anyhow::Error::from))))
}

/// Handle an event POSTed to the feed.
async fn handle_event(Extension(feed): Extension<Arc<RunCompletionFeed>>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|val| val.to_str().ok());
    feed.receive(content_type, &body).await
}
