mod ml_metadata;

pub type ValueKind = ml_metadata::value::Value;
pub type EventType = ml_metadata::event::Type;

pub use ml_metadata::metadata_store_service_client::MetadataStoreServiceClient;
pub use ml_metadata::*;
