//! Request types for the stdio lookup protocol.

use serde::{Deserialize, Serialize};

/// Request ID echoed back in the response (number or string).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

/// One line of the stdio protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    /// Optional caller-chosen ID.
    #[serde(default)]
    pub id: Option<RequestId>,

    /// Operation to perform.
    #[serde(flatten)]
    pub op: Operation,
}

impl LookupRequest {
    /// Creates a `get` request.
    pub fn get(id: impl Into<RequestId>, key: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            op: Operation::Get { key: key.into() },
        }
    }
}

/// Operations understood by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Cached lookup, resolving on a miss.
    Get { key: String },

    /// Drops one entry from the cache.
    Invalidate { key: String },

    /// Drops every entry.
    Clear,

    /// Reports cache and resolver counters.
    Stats,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Get { .. } => write!(f, "get"),
            Operation::Invalidate { .. } => write!(f, "invalidate"),
            Operation::Clear => write!(f, "clear"),
            Operation::Stats => write!(f, "stats"),
        }
    }
}
