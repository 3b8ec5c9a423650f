//! Resolver wrapping a closure.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use super::base::Resolver;
use crate::types::errors::ResolveError;

/// Adapts a plain function into a [`Resolver`].
pub struct FnResolver<F> {
    name: String,
    func: F,
    latency: Duration,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> Result<Bytes, ResolveError> + Send + Sync,
{
    /// Creates a resolver named `name` that delegates to `func`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            latency: Duration::ZERO,
        }
    }

    /// Sets a delay applied before every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl<F> Resolver for FnResolver<F>
where
    F: Fn(&str) -> Result<Bytes, ResolveError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, key: &str) -> Result<Bytes, ResolveError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.func)(key)
    }
}
