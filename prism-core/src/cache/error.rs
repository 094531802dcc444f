use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("environment variable {var} is not set (required by {path})")]
    MissingEnvVar { var: String, path: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot match replacement tokens of {path}: {source}")]
    Tokens {
        path: String,
        #[source]
        source: aho_corasick::BuildError,
    },

    #[error("failed to compress {path}: {source}")]
    Compress {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
