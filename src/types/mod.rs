//! Shared types: configuration, errors, protocol requests and responses.

pub mod config;
pub mod errors;
pub mod requests;
pub mod responses;
