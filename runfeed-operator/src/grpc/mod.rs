mod run_completion_event_trigger;

pub use run_completion_event_trigger::run_completion_event_trigger_client::RunCompletionEventTriggerClient;
pub use run_completion_event_trigger::*;
