//! Payload resolvers.
//!
//! A resolver is the expensive collaborator behind the cache: it produces
//! bytes for a key or fails. The cache never calls it directly; the lookup
//! service does, on a miss.

mod base;
mod func;
mod table;

pub use base::Resolver;
pub use func::FnResolver;
pub use table::StaticResolver;
