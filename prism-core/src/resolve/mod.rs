mod alias;
mod provider;


pub use alias::{ResolveError, resolve_entry};
pub use provider::{FileProvider, SetupFiles, SetupProvider};
