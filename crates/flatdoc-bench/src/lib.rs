//! Benchmark fixtures for flatdoc
//!
//! A log-record shaped document with a hand-written `ArenaEncode` impl and a
//! derived `Serialize` impl, so both encoding paths run on identical data.

use flatdoc::{
    ArenaBuilder, ArenaEncode, Idx,
    encode::{append_field, append_optional_field},
};
use serde::Serialize;

/// Request metadata nested inside a [`LogRecord`]
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Response status
    pub status: u16,
}

/// One structured log line
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Milliseconds since the epoch
    pub timestamp: i64,
    /// Severity
    pub level: String,
    /// Message text
    pub message: String,
    /// Handler latency in milliseconds
    pub latency_ms: f64,
    /// Free-form labels
    pub tags: Vec<String>,
    /// Present for request logs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
}

impl ArenaEncode for RequestInfo {
    fn append_to_arena(&self, b: &mut ArenaBuilder) -> Idx {
        b.object_start_reserve(3);
        append_field(b, "method", &self.method);
        append_field(b, "path", &self.path);
        append_field(b, "status", &self.status);
        b.object_end()
    }
}

impl ArenaEncode for LogRecord {
    fn append_to_arena(&self, b: &mut ArenaBuilder) -> Idx {
        b.object_start_reserve(6);
        append_field(b, "timestamp", &self.timestamp);
        append_field(b, "level", &self.level);
        append_field(b, "message", &self.message);
        append_field(b, "latency_ms", &self.latency_ms);
        append_field(b, "tags", &self.tags);
        append_optional_field(b, "request", self.request.as_ref());
        b.object_end()
    }
}

/// Deterministic batch of `count` records; every third carries request info
pub fn log_records(count: usize) -> Vec<LogRecord> {
    const LEVELS: [&str; 4] = ["DEBUG", "INFO", "WARN", "ERROR"];
    (0..count)
        .map(|i| LogRecord {
            timestamp: 1_700_000_000_000 + i as i64,
            level: LEVELS[i % LEVELS.len()].to_string(),
            message: format!("processed item {i} in \"stage\" {}", i % 7),
            latency_ms: (i % 100) as f64 * 0.25,
            tags: (0..i % 4).map(|t| format!("tag{t}")).collect(),
            request: (i % 3 == 0).then(|| RequestInfo {
                method: "GET".to_string(),
                path: format!("/items/{i}"),
                status: 200,
            }),
        })
        .collect()
}
