//! Provider error abstractions.

use thiserror::Error;

use crate::stream::Outcome;

/// Errors raised while resolving a completed run against its provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The run is unknown to the provider.
    #[error("run not found: {0}")]
    NotFound(String),
    /// The provider returned an error response.
    #[error("provider API error: {0}")]
    Api(String),
    /// The provider could not be reached.
    #[error("provider transport error: {0}")]
    Transport(#[source] anyhow::Error),
    /// The provider returned data which could not be interpreted.
    #[error("malformed provider data: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// The outcome to report upstream for a message which failed with this error.
    ///
    /// A run which the provider does not know about can never be resolved, every other failure
    /// is treated as transient.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::NotFound(_) => Outcome::UnrecoverableFailure,
            Self::Api(_) | Self::Transport(_) | Self::Malformed(_) => Outcome::RecoverableFailure,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(src: reqwest::Error) -> Self {
        Self::Transport(src.into())
    }
}

impl From<tonic::Status> for ProviderError {
    fn from(src: tonic::Status) -> Self {
        match src.code() {
            tonic::Code::NotFound => Self::NotFound(src.message().to_string()),
            _ => Self::Api(src.to_string()),
        }
    }
}
