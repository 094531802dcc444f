use crate::cache::SubstitutionError;
use crate::resolve::ResolveError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("setup provider failed: {message}")]
    Provider { message: String },

    #[error("cannot listen on {addr}: {message}")]
    Transport { addr: String, message: String },

    #[error("TLS material rejected: {message}")]
    Tls { message: String },

    #[error("failed to start control runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ServeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn provider(err: &anyhow::Error) -> Self {
        Self::Provider {
            message: format!("{err:#}"),
        }
    }

    pub fn transport(addr: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            addr: addr.into(),
            message: message.to_string(),
        }
    }

    pub fn tls(message: impl std::fmt::Display) -> Self {
        Self::Tls {
            message: message.to_string(),
        }
    }
}
