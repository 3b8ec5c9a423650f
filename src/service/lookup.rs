//! Cache-aside lookup service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use super::inflight::InFlight;
use crate::cache::BoundedCache;
use crate::resolver::Resolver;
use crate::types::config::CacheConfig;
use crate::types::errors::ResolveError;
use crate::types::responses::{Lookup, ServiceStats, Source};

/// Serves payloads from a [`BoundedCache`], falling back to a [`Resolver`]
/// on a miss.
///
/// The cache lock is released before the resolver runs, so one slow
/// resolution never stalls lookups of other keys. Only successful
/// resolutions are stored; a failure is returned to the caller and the next
/// lookup of that key resolves again.
///
/// Concurrent misses on the same key each call the resolver unless single
/// flight is enabled, in which case they share one call.
pub struct LookupService {
    cache: BoundedCache<String, Bytes>,
    resolver: Arc<dyn Resolver>,
    inflight: Option<InFlight>,
    resolutions: AtomicU64,
    failures: AtomicU64,
    shared: AtomicU64,
}

impl LookupService {
    /// Creates a service over an existing cache.
    pub fn new(cache: BoundedCache<String, Bytes>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            cache,
            resolver,
            inflight: None,
            resolutions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            shared: AtomicU64::new(0),
        }
    }

    /// Creates a service from the `[cache]` config section.
    pub fn from_config(config: &CacheConfig, resolver: Arc<dyn Resolver>) -> Self {
        let service = Self::new(BoundedCache::new(config.capacity), resolver);
        if config.single_flight {
            service.with_single_flight()
        } else {
            service
        }
    }

    /// Enables sharing of concurrent resolutions for the same key.
    #[must_use]
    pub fn with_single_flight(mut self) -> Self {
        self.inflight = Some(InFlight::new());
        self
    }

    pub fn single_flight(&self) -> bool {
        self.inflight.is_some()
    }

    /// The underlying cache.
    pub fn cache(&self) -> &BoundedCache<String, Bytes> {
        &self.cache
    }

    /// The resolver consulted on misses.
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Returns the payload for `key`, resolving and caching it on a miss.
    pub async fn lookup(&self, key: &str) -> Result<Lookup, ResolveError> {
        if let Some(payload) = self.cache.get(key) {
            debug!(key, "Cache hit");
            return Ok(Lookup {
                payload,
                source: Source::Cache,
            });
        }
        debug!(key, "Cache miss");

        let payload = match &self.inflight {
            Some(inflight) => {
                let joined = inflight.run(key, || self.resolve_and_store(key)).await;
                if joined.shared {
                    self.shared.fetch_add(1, Ordering::Relaxed);
                    debug!(key, "Joined in-flight resolution");
                }
                joined.result?
            }
            None => self.resolve_and_store(key).await?,
        };

        Ok(Lookup {
            payload,
            source: Source::Resolver,
        })
    }

    async fn resolve_and_store(&self, key: &str) -> Result<Bytes, ResolveError> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        match self.resolver.resolve(key).await {
            Ok(payload) => {
                self.cache.set(key.to_string(), payload.clone());
                debug!(key, size = payload.len(), "Stored resolved payload");
                Ok(payload)
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key,
                    resolver = self.resolver.name(),
                    error = %err,
                    "Resolution failed"
                );
                Err(err)
            }
        }
    }

    /// Drops `key` from the cache. Returns true if it was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.invalidate(key).is_some()
    }

    /// Drops every cached payload.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Returns cache and resolver counters.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.cache.stats(),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            shared: self.shared.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for LookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupService")
            .field("cache", &self.cache)
            .field("resolver", &self.resolver.name())
            .field("single_flight", &self.single_flight())
            .finish()
    }
}
