//! Operator error abstractions.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors returned by run completion event handlers.
///
/// Each variant maps onto the status code returned to the provider, which decides whether the
/// event is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The event can never be processed as given.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    /// A resource referenced by the event no longer exists.
    #[error("missing resource: {0}")]
    MissingResource(String),
    /// Processing failed and may succeed when retried.
    #[error("error processing event: {0}")]
    Fatal(String),
}

impl EventError {
    /// The HTTP status code reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::MissingResource(_) => StatusCode::GONE,
            Self::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The precedence of this error when several handlers fail.
    fn severity(&self) -> u8 {
        match self {
            Self::MissingResource(_) => 0,
            Self::InvalidEvent(_) => 1,
            Self::Fatal(_) => 2,
        }
    }

    /// Pick the most severe of the given errors, if any.
    pub fn most_severe(errors: impl IntoIterator<Item = EventError>) -> Option<EventError> {
        errors.into_iter().max_by_key(|err| err.severity())
    }
}

impl From<ResourceError> for EventError {
    fn from(src: ResourceError) -> Self {
        match src {
            ResourceError::NotFound(_) => Self::MissingResource(src.to_string()),
            ResourceError::Timeout(_) | ResourceError::Api(_) => Self::Fatal(src.to_string()),
        }
    }
}

/// Errors from reading or writing pipeline resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The K8s API did not answer in time.
    #[error("timeout while calling K8s API for {0}")]
    Timeout(String),
    /// The K8s API returned an error.
    #[error("error calling K8s API: {0}")]
    Api(#[source] kube::Error),
}

impl ResourceError {
    /// Classify a K8s client error for the named resource.
    pub fn from_kube(resource: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(api_err) if api_err.code == StatusCode::NOT_FOUND => Self::NotFound(resource.into()),
            _ => Self::Api(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
