use crate::resolve::provider::FileProvider;
use crate::setup::{FileEntry, ServerSetup};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("alias cycle while resolving {path}: {}", chain.join(" -> "))]
    AliasCycle { path: String, chain: Vec<String> },
}

/// Resolve a request path to the file that answers it.
///
/// Order: a direct file match, then an alias whose `from` equals the path
/// (followed to its target, which may itself be an alias), then the catch-all.
/// `Ok(None)` means not found. Alias chains that revisit a path are an error.
pub async fn resolve_entry(
    setup: &ServerSetup,
    files: &dyn FileProvider,
    path: &str,
) -> Result<Option<FileEntry>, ResolveError> {
    let mut chain = vec![path.to_string()];
    let mut current = path;

    loop {
        if let Some(file) = files.lookup(setup, current).await {
            return Ok(Some(file));
        }

        let Some(alias) = setup.aliases.iter().find(|a| a.from == current) else {
            return Ok(setup.catch_all_file.clone());
        };

        if chain.iter().any(|seen| *seen == alias.to) {
            chain.push(alias.to.clone());
            return Err(ResolveError::AliasCycle {
                path: path.to_string(),
                chain,
            });
        }

        tracing::trace!(from = %alias.from, to = %alias.to, "following alias");
        chain.push(alias.to.clone());
        current = &alias.to;
    }
}
