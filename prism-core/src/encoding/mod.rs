mod compress;
mod negotiate;
mod select;


pub use compress::compress;
pub use negotiate::{IDENTITY_BASELINE_WEIGHT, parse_accept_encoding};
pub use select::{Variant, select_variant};

use std::fmt;

/// A rendering of an asset the server knows how to pick between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingName {
    Identity,
    Gzip,
    Deflate,
    Brotli,
}

impl EncodingName {
    pub const COMPRESSED: [EncodingName; 3] = [
        EncodingName::Gzip,
        EncodingName::Deflate,
        EncodingName::Brotli,
    ];

    /// Internal name, also used in setup documents.
    pub fn as_str(self) -> &'static str {
        match self {
            EncodingName::Identity => "identity",
            EncodingName::Gzip => "gzip",
            EncodingName::Deflate => "deflate",
            EncodingName::Brotli => "brotli",
        }
    }

    /// Value for the `Content-Encoding` header. Identity is never announced.
    pub fn content_encoding(self) -> Option<&'static str> {
        match self {
            EncodingName::Identity => None,
            EncodingName::Gzip => Some("gzip"),
            EncodingName::Deflate => Some("deflate"),
            EncodingName::Brotli => Some("br"),
        }
    }
}

impl fmt::Display for EncodingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoding the client accepts, with its `q` weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoding {
    pub name: EncodingName,
    pub weight: f32,
}

impl Encoding {
    pub fn new(name: EncodingName, weight: f32) -> Self {
        Self { name, weight }
    }
}
