//! Bounded LRU cache for resolved payloads.
//!
//! This module implements a thread-safe Least Recently Used (LRU) cache that
//! sits between concurrent lookups and the expensive payload resolver. The
//! hash index and the recency list share one arena-backed structure guarded
//! by a single lock.

mod arena;
mod lru;

pub use lru::BoundedCache;
