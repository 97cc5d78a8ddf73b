//! Sources of raw run completion signals.

mod subscription;
mod workflow;

use std::time::Duration;

use futures::stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

pub use subscription::{PubSubSubscription, Subscription, SubscriptionSource};
pub use workflow::WorkflowSource;

/// Sleep for the given duration, returning `true` if shutdown was signalled meanwhile.
async fn sleep_or_shutdown(shutdown: &mut BroadcastStream<()>, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.next() => true,
    }
}

#[cfg(test)]
mod mod_test;
