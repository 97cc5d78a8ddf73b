//! Runfeed error abstractions.

use thiserror::Error;

/// Core model error variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A namespaced name had a namespace but no name.
    #[error("namespace provided without a name")]
    NamespaceWithoutName,
    /// A namespaced name string contained more than one separator.
    #[error("namespaced name must be separated by at most one `/`")]
    TooManySeparators,
    /// A namespaced name string had an empty segment around its separator.
    #[error("name and namespace must not be empty when separated by `/`")]
    EmptySegment,
    /// An output artifact path did not match the expected grammar.
    #[error("invalid artifact path `{0}`, expected `component:artifact[:index][[filter]]`")]
    InvalidArtifactPath(String),
}
