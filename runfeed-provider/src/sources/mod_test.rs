use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::*;

#[tokio::test]
async fn backoff_is_cut_short_by_shutdown() -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut shutdown = BroadcastStream::new(shutdown_rx);
    let _ = shutdown_tx.send(());

    let interrupted = tokio::time::timeout(Duration::from_secs(5), sleep_or_shutdown(&mut shutdown, Duration::from_secs(3600))).await?;
    assert!(interrupted, "expected the backoff to observe shutdown");
    Ok(())
}

#[tokio::test]
async fn backoff_elapses_without_shutdown() -> Result<()> {
    let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let mut shutdown = BroadcastStream::new(shutdown_rx);

    let interrupted = sleep_or_shutdown(&mut shutdown, Duration::from_millis(10)).await;
    assert!(!interrupted, "expected the backoff to elapse");
    Ok(())
}
