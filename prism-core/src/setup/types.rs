use crate::encoding::EncodingName;
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat `name -> value` header map, as declared in a setup document.
pub type Headers = BTreeMap<String, String>;

/// `token -> environment variable name` pairs applied to a text asset.
pub type EnvReplacements = BTreeMap<String, String>;

/// A validated, immutable description of everything the server responds with.
///
/// A setup is never mutated in place. Reloading installs a whole new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSetup {
    pub aliases: Vec<Alias>,
    pub folders: Folders,
    pub files: Vec<FileEntry>,
    pub catch_all_file: Option<FileEntry>,
    pub global_headers: Headers,
}

impl ServerSetup {
    /// Every file the setup declares, the catch-all included.
    pub fn all_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().chain(self.catch_all_file.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub from: String,
    pub to: String,
}

/// Base directories holding each rendering of the assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folders {
    pub identity: String,
    pub gzip: String,
    pub deflate: String,
    pub brotli: String,
}

impl Folders {
    pub fn for_encoding(&self, encoding: EncodingName) -> &str {
        match encoding {
            EncodingName::Identity => &self.identity,
            EncodingName::Gzip => &self.gzip,
            EncodingName::Deflate => &self.deflate,
            EncodingName::Brotli => &self.brotli,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub mime: String,
    pub status_code: u16,
    pub headers: Headers,
    pub sizes: Sizes,
    pub env_replacements: EnvReplacements,
    pub hash: Option<String>,
}

impl FileEntry {
    /// Location of this file relative to an encoding folder.
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

/// Byte sizes of the variants present on disk. `None` means the variant does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sizes {
    pub identity: u64,
    pub gzip: Option<u64>,
    pub deflate: Option<u64>,
    pub brotli: Option<u64>,
}

impl Sizes {
    pub fn get(&self, encoding: EncodingName) -> Option<u64> {
        match encoding {
            EncodingName::Identity => Some(self.identity),
            EncodingName::Gzip => self.gzip,
            EncodingName::Deflate => self.deflate,
            EncodingName::Brotli => self.brotli,
        }
    }

    /// True when at least one compressed rendering exists.
    pub fn has_compressed(&self) -> bool {
        self.gzip.is_some() || self.deflate.is_some() || self.brotli.is_some()
    }
}
