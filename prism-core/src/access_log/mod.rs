//! Per-request access log.
//!
//! The coordinator hands every completed request to a [`RequestLogger`] exactly once,
//! success and failure alike. The default logger emits one `tracing` event on the
//! `prism::access` target carrying the individual fields and the Common Log Format line.

mod format;


pub use format::{common_log_line, format_time};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLog {
    pub ip: Option<String>,
    /// Authenticated user. The server never authenticates, so this is only set by embedders.
    pub user: Option<String>,
    pub method: String,
    pub path: String,
    pub query_string: Option<String>,
    pub protocol: String,
    pub status_code: u16,
    pub response_size: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time: DateTime<Utc>,
    pub response_time: DateTime<Utc>,
}

impl RequestLog {
    pub fn duration_ms(&self) -> i64 {
        (self.response_time - self.request_time).num_milliseconds()
    }
}

pub trait RequestLogger: Send + Sync {
    fn log(&self, entry: &RequestLog);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn log(&self, entry: &RequestLog) {
        tracing::info!(
            target: "prism::access",
            ip = entry.ip.as_deref(),
            method = %entry.method,
            path = %entry.path,
            query = entry.query_string.as_deref(),
            protocol = %entry.protocol,
            status = entry.status_code,
            size = entry.response_size,
            referer = entry.referer.as_deref(),
            user_agent = entry.user_agent.as_deref(),
            duration_ms = entry.duration_ms(),
            "{}",
            common_log_line(entry)
        );
    }
}
