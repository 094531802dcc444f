use crate::cache::env::{EnvLookup, ProcessEnv};
use crate::cache::error::SubstitutionError;
use crate::cache::substitute::replace_tokens;
use crate::encoding::{EncodingName, compress};
use crate::setup::{EnvReplacements, FileEntry, ServerSetup, Sizes};
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

/// Every rendering of one substituted asset.
#[derive(Debug, Clone)]
pub struct VariantContent {
    pub identity: Bytes,
    pub gzip: Bytes,
    pub deflate: Bytes,
    pub brotli: Bytes,
}

impl VariantContent {
    pub fn get(&self, encoding: EncodingName) -> &Bytes {
        match encoding {
            EncodingName::Identity => &self.identity,
            EncodingName::Gzip => &self.gzip,
            EncodingName::Deflate => &self.deflate,
            EncodingName::Brotli => &self.brotli,
        }
    }

    pub fn sizes(&self) -> Sizes {
        Sizes {
            identity: self.identity.len() as u64,
            gzip: Some(self.gzip.len() as u64),
            deflate: Some(self.deflate.len() as u64),
            brotli: Some(self.brotli.len() as u64),
        }
    }
}

/// Substituted content plus the inputs that produced it.
#[derive(Debug)]
pub struct CacheEntry {
    pub hash: Option<String>,
    pub env_replacements: EnvReplacements,
    pub content: VariantContent,
}

/// A resolved file, with its in-memory renderings when it was substituted.
///
/// Without `content` the bytes are read from the encoding folders on disk.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub file: FileEntry,
    pub content: Option<Arc<CacheEntry>>,
}

impl Resolved {
    pub fn on_disk(file: FileEntry) -> Self {
        Self {
            file,
            content: None,
        }
    }
}

/// One cache key. The cell is filled at most once; concurrent requests await the same fill.
struct Slot {
    hash: Option<String>,
    env_replacements: EnvReplacements,
    cell: OnceCell<Arc<CacheEntry>>,
}

impl Slot {
    fn for_file(file: &FileEntry) -> Self {
        Self {
            hash: file.hash.clone(),
            env_replacements: file.env_replacements.clone(),
            cell: OnceCell::new(),
        }
    }

    fn produced(&self, file: &FileEntry) -> bool {
        self.hash == file.hash && self.env_replacements == file.env_replacements
    }
}

/// Cache of environment-substituted assets, keyed by asset path.
///
/// Owned by one server generation; reloading the setup starts from an empty cache.
pub struct VariantCache {
    slots: DashMap<String, Arc<Slot>>,
    env: Arc<dyn EnvLookup>,
    fills: AtomicUsize,
}

impl Default for VariantCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantCache {
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    pub fn with_env(env: Arc<dyn EnvLookup>) -> Self {
        Self {
            slots: DashMap::new(),
            env,
            fills: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.slots.contains_key(path)
    }

    /// Number of read + substitute + compress passes started so far.
    pub fn fill_count(&self) -> usize {
        self.fills.load(Ordering::Relaxed)
    }

    /// Apply the file's environment replacements, serving from cache when possible.
    ///
    /// Files without replacements pass through untouched and are never cached.
    /// A cached entry is rebuilt when the file's hash or replacement map changed.
    pub async fn substitute(
        &self,
        root_dir: &Path,
        setup: &ServerSetup,
        file: FileEntry,
    ) -> Result<Resolved, SubstitutionError> {
        if file.env_replacements.is_empty() {
            return Ok(Resolved::on_disk(file));
        }

        let pairs = match self.replacement_pairs(&file) {
            Ok(pairs) => pairs,
            Err(err) => {
                self.slots.remove(&file.path);
                return Err(err);
            }
        };

        let slot = self.slot_for(&file);
        let source = root_dir
            .join(&setup.folders.identity)
            .join(file.relative_path());

        let filled = slot
            .cell
            .get_or_try_init(|| self.fill(source, &file, pairs))
            .await
            .cloned();

        match filled {
            Ok(entry) => {
                let mut file = file;
                file.sizes = entry.content.sizes();
                Ok(Resolved {
                    file,
                    content: Some(entry),
                })
            }
            Err(err) => {
                self.slots
                    .remove_if(&file.path, |_, current| Arc::ptr_eq(current, &slot));
                Err(err)
            }
        }
    }

    /// Substitute every file of the setup that has replacements, catch-all included.
    ///
    /// Returns how many files were substituted. Stops at the first failure.
    pub async fn preheat(
        &self,
        root_dir: &Path,
        setup: &ServerSetup,
    ) -> Result<usize, SubstitutionError> {
        let mut substituted = 0;
        for file in setup.all_files().filter(|f| !f.env_replacements.is_empty()) {
            self.substitute(root_dir, setup, file.clone()).await?;
            substituted += 1;
        }

        tracing::debug!(substituted, cached = self.len(), "variant cache preheated");
        Ok(substituted)
    }

    fn replacement_pairs(&self, file: &FileEntry) -> Result<Vec<(String, String)>, SubstitutionError> {
        file.env_replacements
            .iter()
            .map(|(token, var)| {
                self.env
                    .var(var)
                    .map(|value| (token.clone(), value))
                    .ok_or_else(|| SubstitutionError::MissingEnvVar {
                        var: var.clone(),
                        path: file.path.clone(),
                    })
            })
            .collect()
    }

    fn slot_for(&self, file: &FileEntry) -> Arc<Slot> {
        match self.slots.entry(file.path.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().produced(file) {
                    return occupied.get().clone();
                }

                tracing::debug!(path = %file.path, "cached variants are stale, rebuilding");
                let slot = Arc::new(Slot::for_file(file));
                occupied.insert(slot.clone());
                slot
            }
            Entry::Vacant(vacant) => {
                let slot = Arc::new(Slot::for_file(file));
                vacant.insert(slot.clone());
                slot
            }
        }
    }

    async fn fill(
        &self,
        source: PathBuf,
        file: &FileEntry,
        pairs: Vec<(String, String)>,
    ) -> Result<Arc<CacheEntry>, SubstitutionError> {
        self.fills.fetch_add(1, Ordering::Relaxed);

        let original = tokio::fs::read(&source)
            .await
            .map_err(|e| SubstitutionError::Read {
                path: source.clone(),
                source: e,
            })?;

        let substituted =
            replace_tokens(&original, &pairs).map_err(|e| SubstitutionError::Tokens {
                path: file.path.clone(),
                source: e,
            })?;
        let content = tokio::task::spawn_blocking(move || compress_all(substituted))
            .await
            .map_err(std::io::Error::other)
            .and_then(|compressed| compressed)
            .map_err(|e| SubstitutionError::Compress {
                path: file.path.clone(),
                source: e,
            })?;

        tracing::debug!(
            path = %file.path,
            identity = content.identity.len(),
            gzip = content.gzip.len(),
            deflate = content.deflate.len(),
            brotli = content.brotli.len(),
            "substituted variants cached"
        );

        Ok(Arc::new(CacheEntry {
            hash: file.hash.clone(),
            env_replacements: file.env_replacements.clone(),
            content,
        }))
    }
}

fn compress_all(substituted: Vec<u8>) -> std::io::Result<VariantContent> {
    let identity = Bytes::from(substituted);

    Ok(VariantContent {
        gzip: Bytes::from(compress(EncodingName::Gzip, &identity)?),
        deflate: Bytes::from(compress(EncodingName::Deflate, &identity)?),
        brotli: Bytes::from(compress(EncodingName::Brotli, &identity)?),
        identity,
    })
}
