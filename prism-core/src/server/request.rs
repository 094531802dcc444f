use http::request::Parts;
use http::{HeaderMap, header};
use percent_encoding::percent_decode_str;

/// What the coordinator needs to know about an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub ip: Option<String>,
    pub method: String,
    /// Percent-decoded path, without the query string.
    pub path: String,
    pub query: Option<String>,
    pub protocol: String,
    pub accept_encoding: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestInfo {
    /// A plain `GET` for `target` (path plus optional `?query`).
    pub fn get(target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            ip: None,
            method: "GET".to_string(),
            path,
            query,
            protocol: "HTTP/1.1".to_string(),
            accept_encoding: None,
            referer: None,
            user_agent: None,
        }
    }

    pub fn with_accept_encoding(mut self, value: &str) -> Self {
        self.accept_encoding = Some(value.to_string());
        self
    }

    pub fn from_parts(parts: &Parts, ip: Option<String>) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let (path, query) = split_target(target);

        Self {
            ip,
            method: parts.method.to_string(),
            path,
            query,
            protocol: format!("{:?}", parts.version),
            accept_encoding: header_value(&parts.headers, header::ACCEPT_ENCODING),
            referer: header_value(&parts.headers, header::REFERER),
            user_agent: header_value(&parts.headers, header::USER_AGENT),
        }
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };
    let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();
    (path, query)
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
