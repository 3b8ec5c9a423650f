//! # Lookaside
//!
//! Cache-aside lookups: a bounded, thread-safe LRU cache in front of an
//! expensive payload resolver.
//!
//! ## Modules
//!
//! - [`cache`] - Bounded LRU cache ([`BoundedCache`])
//! - [`resolver`] - The [`Resolver`] seam and its stock implementations
//! - [`service`] - Cache-first lookups with optional single-flight
//! - [`server`] - Newline-delimited JSON server over stdio
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types (config, errors, requests, responses)

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod resolver;
pub mod server;
pub mod service;
pub mod types;

pub use cache::BoundedCache;
pub use resolver::{FnResolver, Resolver, StaticResolver};
pub use service::LookupService;
pub use types::config::Config;
pub use types::errors::{LookasideError, LookasideResult, ResolveError};
