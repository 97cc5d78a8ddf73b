//! Identity resolution.
//!
//! A run's identity is assembled by an ordered chain of resolvers. Each resolver either yields
//! the references it found, or defers to the next one. References found by later resolvers only
//! fill the fields earlier resolvers left empty, and the chain stops once the identity is
//! complete.

use async_trait::async_trait;

use crate::error::ProviderError;
use runfeed_core::ResourceReferences;

/// The result of a single resolver.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The resolver found (possibly partial) references.
    Resolved(ResourceReferences),
    /// The resolver had nothing to contribute.
    Defer,
}

/// A single strategy for resolving the identity of a run described by `C`.
#[async_trait]
pub trait IdentityResolver<C: Sync>: Send + Sync {
    /// A short name used when logging.
    fn name(&self) -> &'static str;

    /// Attempt to resolve references for the given run.
    async fn resolve(&self, ctx: &C) -> Result<Resolution, ProviderError>;
}

/// An ordered chain of resolvers.
pub struct ResolverChain<C> {
    resolvers: Vec<Box<dyn IdentityResolver<C>>>,
}

impl<C: Sync> ResolverChain<C> {
    /// Create a new instance from resolvers in order of precedence.
    pub fn new(resolvers: Vec<Box<dyn IdentityResolver<C>>>) -> Self {
        Self { resolvers }
    }

    /// Run the chain against the given run.
    ///
    /// The first error aborts the chain. A chain where every resolver defers yields empty
    /// references.
    pub async fn resolve(&self, ctx: &C) -> Result<ResourceReferences, ProviderError> {
        let mut references = ResourceReferences::default();
        for resolver in self.resolvers.iter() {
            match resolver.resolve(ctx).await? {
                Resolution::Resolved(found) => {
                    tracing::debug!(resolver = resolver.name(), "identity resolved");
                    references.merge_missing(found);
                }
                Resolution::Defer => {
                    tracing::trace!(resolver = resolver.name(), "identity resolver deferred");
                    continue;
                }
            }
            if references.is_complete() {
                break;
            }
        }
        Ok(references)
    }
}
