//! Lookup service: cache first, resolver on a miss.

mod inflight;
mod lookup;

pub use lookup::LookupService;
