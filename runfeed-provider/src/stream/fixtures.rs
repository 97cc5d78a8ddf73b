//! Test fixtures for stream messages.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Acknowledge, Outcome};

/// An acknowledgement which records every outcome it receives.
#[derive(Clone, Default)]
pub struct RecordingAck {
    pub outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl RecordingAck {
    /// All outcomes recorded so far.
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().map(|outcomes| outcomes.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Acknowledge for RecordingAck {
    async fn acknowledge(self: Box<Self>, outcome: Outcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome);
        }
    }
}
