//! Resolver backed by a fixed key/payload table.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::base::Resolver;
use crate::types::config::ResolverConfig;
use crate::types::errors::ResolveError;

/// Serves payloads from an in-memory table.
///
/// Unknown keys fail with [`ResolveError::NotFound`]. An optional latency
/// stands in for the cost of a real pipeline.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Bytes>,
    latency: Duration,
}

impl StaticResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver from the `[resolver]` config section.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let entries = config
            .entries
            .iter()
            .map(|(key, payload)| (key.clone(), Bytes::from(payload.clone())))
            .collect();

        Self {
            entries,
            latency: Duration::from_millis(config.latency_ms),
        }
    }

    /// Adds a payload.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        self.entries.insert(key.into(), payload.into());
        self
    }

    /// Sets the simulated latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve(&self, key: &str) -> Result<Bytes, ResolveError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.entries.get(key) {
            Some(payload) => {
                debug!(key, size = payload.len(), "Resolved payload from table");
                Ok(payload.clone())
            }
            None => {
                debug!(key, "Key not present in resolver table");
                Err(ResolveError::not_found(key))
            }
        }
    }
}
