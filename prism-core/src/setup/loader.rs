use crate::setup::error::SetupError;
use crate::setup::types::ServerSetup;
use crate::setup::validate::validate_setup;
use std::fs;
use std::path::{Path, PathBuf};

/// A validated setup together with the directory its folders are relative to.
#[derive(Debug, Clone)]
pub struct LoadedSetup {
    pub root_dir: PathBuf,
    pub setup: ServerSetup,
}

/// Read, parse and validate a setup document.
///
/// The root directory is the directory containing the document.
pub fn load_setup(path: &Path) -> Result<LoadedSetup, SetupError> {
    let absolute = match path.canonicalize() {
        Ok(p) => p,
        Err(e) => return Err(SetupError::read_file(path, e)),
    };

    let contents = fs::read_to_string(&absolute).map_err(|e| SetupError::read_file(&absolute, e))?;
    let raw: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| SetupError::parse(&absolute, e))?;
    let setup = validate_setup(&raw).map_err(|e| SetupError::invalid(&absolute, e))?;

    let root_dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    tracing::debug!(
        path = %absolute.display(),
        files = setup.files.len(),
        aliases = setup.aliases.len(),
        catch_all = setup.catch_all_file.is_some(),
        "setup loaded"
    );

    Ok(LoadedSetup { root_dir, setup })
}
