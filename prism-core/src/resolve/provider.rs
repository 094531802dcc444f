use crate::setup::{FileEntry, LoadedSetup, ServerSetup};
use async_trait::async_trait;

/// Source of file metadata for a request path.
///
/// Replaces the lookup among `setup.files`, e.g. to read metadata from a database.
#[async_trait]
pub trait FileProvider: Send + Sync {
    async fn lookup(&self, setup: &ServerSetup, path: &str) -> Option<FileEntry>;
}

/// Exact-match lookup among the files of the setup. First match wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetupFiles;

#[async_trait]
impl FileProvider for SetupFiles {
    async fn lookup(&self, setup: &ServerSetup, path: &str) -> Option<FileEntry> {
        setup.files.iter().find(|f| f.path == path).cloned()
    }
}

/// Source of a fresh setup, consulted once per request when installed.
#[async_trait]
pub trait SetupProvider: Send + Sync {
    async fn current(&self) -> anyhow::Result<LoadedSetup>;
}
