mod error;
mod loader;
mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use error::{SetupError, ValidationError};
pub use loader::{LoadedSetup, load_setup};
pub use types::{Alias, EnvReplacements, FileEntry, Folders, Headers, ServerSetup, Sizes};
pub use validate::validate_setup;
