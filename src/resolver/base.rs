//! Base trait for payload resolvers.

use async_trait::async_trait;
use bytes::Bytes;

use crate::types::errors::ResolveError;

/// Produces the payload for a key, or fails.
///
/// A resolver wraps whatever expensive pipeline computes payloads. The
/// lookup service calls it only on a cache miss and never while holding the
/// cache lock, so implementations are free to be slow. Failures are passed
/// back to the caller and are never cached.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver name, used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Computes the payload for `key`.
    async fn resolve(&self, key: &str) -> Result<Bytes, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperResolver;

    #[async_trait]
    impl Resolver for UpperResolver {
        fn name(&self) -> &str {
            "upper"
        }

        async fn resolve(&self, key: &str) -> Result<Bytes, ResolveError> {
            if key.is_empty() {
                return Err(ResolveError::not_found(key));
            }
            Ok(Bytes::from(key.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let resolver: Box<dyn Resolver> = Box::new(UpperResolver);

        assert_eq!(resolver.name(), "upper");
        assert_eq!(resolver.resolve("ls").await.unwrap(), Bytes::from("LS"));
        assert!(resolver.resolve("").await.is_err());
    }
}
