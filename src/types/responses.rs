//! Response and result types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::errors::ResolveError;
use super::requests::RequestId;

/// Where a looked-up payload came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Served from the cache.
    Cache,
    /// Produced by the resolver on a miss.
    Resolver,
}

/// Successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// The payload bytes.
    pub payload: Bytes,

    /// Origin of the payload.
    pub source: Source,
}

impl Lookup {
    /// True when the payload was served from the cache.
    pub fn is_hit(&self) -> bool {
        self.source == Source::Cache
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of hits.
    pub hits: u64,

    /// Number of misses.
    pub misses: u64,

    /// Entries dropped to make room for new keys.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lookup service statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Cache counters.
    pub cache: CacheStats,

    /// Calls made to the resolver.
    pub resolutions: u64,

    /// Resolver calls that failed.
    pub failures: u64,

    /// Misses answered by another caller's in-flight resolution.
    pub shared: u64,
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Hit,
    Miss,
    NotFound,
    Ok,
    Error,
}

/// One line written back by the stdio server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    /// ID of the original request (`null` when absent or unparseable).
    pub id: Option<RequestId>,

    /// Outcome.
    pub status: Status,

    /// UTF-8 payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Hex-encoded payload, used when the bytes are not valid UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hex: Option<String>,

    /// Whether an invalidation removed an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,

    /// Service counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ServiceStats>,

    /// Seconds since the server started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,

    /// Error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupResponse {
    fn with_status(id: Option<RequestId>, status: Status) -> Self {
        Self {
            id,
            status,
            payload: None,
            payload_hex: None,
            removed: None,
            stats: None,
            uptime_secs: None,
            error: None,
        }
    }

    /// Response for a successful lookup.
    pub fn found(id: Option<RequestId>, lookup: &Lookup) -> Self {
        let status = if lookup.is_hit() {
            Status::Hit
        } else {
            Status::Miss
        };
        let mut response = Self::with_status(id, status);
        match std::str::from_utf8(&lookup.payload) {
            Ok(text) => response.payload = Some(text.to_string()),
            Err(_) => response.payload_hex = Some(hex::encode(&lookup.payload)),
        }
        response
    }

    /// Response for a failed resolution.
    pub fn not_found(id: Option<RequestId>, err: &ResolveError) -> Self {
        let mut response = Self::with_status(id, Status::NotFound);
        response.error = Some(err.to_string());
        response
    }

    /// Plain acknowledgement.
    pub fn ok(id: Option<RequestId>) -> Self {
        Self::with_status(id, Status::Ok)
    }

    /// Acknowledgement of an invalidation.
    pub fn removed(id: Option<RequestId>, removed: bool) -> Self {
        let mut response = Self::ok(id);
        response.removed = Some(removed);
        response
    }

    /// Statistics report.
    pub fn stats(id: Option<RequestId>, stats: ServiceStats, uptime_secs: u64) -> Self {
        let mut response = Self::ok(id);
        response.stats = Some(stats);
        response.uptime_secs = Some(uptime_secs);
        response
    }

    /// Protocol error.
    pub fn error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        let mut response = Self::with_status(id, Status::Error);
        response.error = Some(message.into());
        response
    }

    /// Decodes the payload carried by this response, if any.
    pub fn payload_bytes(&self) -> Option<Vec<u8>> {
        if let Some(text) = &self.payload {
            return Some(text.as_bytes().to_vec());
        }
        self.payload_hex
            .as_ref()
            .and_then(|encoded| hex::decode(encoded).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            size: 1,
            capacity: 10,
            hits: 2,
            misses: 1,
            evictions: 0,
        };
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_found_response_text_payload() {
        let lookup = Lookup {
            payload: Bytes::from_static(b"LS(1)"),
            source: Source::Cache,
        };
        let response = LookupResponse::found(Some(RequestId::Number(7)), &lookup);
        let json = serde_json::to_string(&response).unwrap();

        assert_eq!(json, r#"{"id":7,"status":"hit","payload":"LS(1)"}"#);
    }

    #[test]
    fn test_found_response_binary_payload() {
        let lookup = Lookup {
            payload: Bytes::from_static(&[0xff, 0x00, 0x1f]),
            source: Source::Resolver,
        };
        let response = LookupResponse::found(None, &lookup);

        assert_eq!(response.status, Status::Miss);
        assert!(response.payload.is_none());
        assert_eq!(response.payload_hex.as_deref(), Some("ff001f"));
        assert_eq!(response.payload_bytes(), Some(vec![0xff, 0x00, 0x1f]));
    }

    #[test]
    fn test_not_found_response() {
        let err = ResolveError::not_found("nope");
        let response = LookupResponse::not_found(Some(RequestId::from("a")), &err);
        let json: serde_json::Value = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], "a");
        assert_eq!(json["status"], "not_found");
        assert!(json["error"].as_str().unwrap().contains("nope"));
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_error_response_has_null_id() {
        let response = LookupResponse::error(None, "bad line");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.starts_with(r#"{"id":null,"status":"error""#));
    }
}
