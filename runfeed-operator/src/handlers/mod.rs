//! Downstream handlers of run completion events.

mod status_updater;
mod trigger;

use async_trait::async_trait;
use runfeed_core::RunCompletionEvent;

use crate::error::EventError;

pub use status_updater::StatusUpdater;
pub use trigger::TriggerForwarder;

/// A consumer of run completion events.
#[async_trait]
pub trait RunCompletionEventHandler: Send + Sync + 'static {
    /// The name of this handler, used in logs.
    fn name(&self) -> &'static str;

    /// Handle the given event.
    async fn handle(&self, event: &RunCompletionEvent) -> Result<(), EventError>;
}
