use std::path::PathBuf;
use thiserror::Error;

/// A setup document that does not describe a servable catalog.
///
/// `field` is a human-readable location such as `files[2].sizes.gzip`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("setup must be an object")]
    NotAnObject,

    #[error("folders are required")]
    MissingFolders,

    #[error("{field} must be a string")]
    NotString { field: String },

    #[error("{field} must be an integer")]
    NotInteger { field: String },

    #[error("{field} must be an object")]
    NotObject { field: String },

    #[error("{field} must be a list")]
    NotList { field: String },

    #[error("{field} must start with a `/`")]
    RelativePath { field: String },

    #[error("{field} must have a value")]
    EmptyMime { field: String },

    #[error("{field} must be a valid status code, got {value}")]
    InvalidStatusCode { field: String, value: i64 },

    #[error("{field} must be a string-string dictionary")]
    InvalidHeaders { field: String },

    #[error("{field} must contain `from` and `to` strings")]
    InvalidAlias { field: String },

    #[error("setup must contain at least one file or a catch-all file")]
    NoFiles,
}

impl ValidationError {
    pub(crate) fn not_string(field: impl Into<String>) -> Self {
        Self::NotString {
            field: field.into(),
        }
    }

    pub(crate) fn not_integer(field: impl Into<String>) -> Self {
        Self::NotInteger {
            field: field.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to read setup file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setup in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl SetupError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(path: impl Into<PathBuf>, source: ValidationError) -> Self {
        Self::Invalid {
            path: path.into(),
            source,
        }
    }
}
