use crate::encoding::EncodingName;
use crate::setup::{FileEntry, ServerSetup};
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};

pub const NOT_FOUND_BODY: &str = "Not found\n";
pub const INTERNAL_ERROR_BODY: &str = "Internal server error\n";

/// A fully buffered response, in the order its headers will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl StaticResponse {
    pub fn not_found() -> Self {
        Self::plain_text(404, NOT_FOUND_BODY)
    }

    pub fn internal_error() -> Self {
        Self::plain_text(500, INTERNAL_ERROR_BODY)
    }

    fn plain_text(status: u16, body: &'static str) -> Self {
        let mut response = Self {
            status,
            headers: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
        };
        response.set_header("Content-Type", "text/plain");
        response.set_header("Content-Length", &body.len().to_string());
        response
    }

    /// Response for one variant of an asset.
    ///
    /// Global headers come first, then the file's own headers. Content metadata is written last.
    pub fn asset(setup: &ServerSetup, file: &FileEntry, encoding: EncodingName, body: Bytes) -> Self {
        let mut response = Self {
            status: file.status_code,
            headers: Vec::new(),
            body,
        };

        if file.sizes.has_compressed() {
            response.set_header("Vary", "Accept-Encoding");
        }
        for (name, value) in setup.global_headers.iter().chain(&file.headers) {
            response.set_header(name, value);
        }

        response.set_header("Content-Type", &file.mime);
        let length = response.body.len().to_string();
        response.set_header("Content-Length", &length);
        if let Some(content_encoding) = encoding.content_encoding() {
            response.set_header("Content-Encoding", content_encoding);
        }
        response
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any earlier value with the same case-insensitive name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Convert into an `http::Response`, dropping headers that are not valid on the wire.
    pub fn into_http(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body.to_vec());
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping header that is not valid HTTP"),
            }
        }
        response
    }
}
