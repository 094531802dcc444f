mod env;
mod error;
mod substitute;
mod variant_cache;

#[cfg(test)]
mod tests;

pub use env::{EnvLookup, ProcessEnv};
pub use error::SubstitutionError;
pub use substitute::replace_tokens;
pub use variant_cache::{CacheEntry, Resolved, VariantCache, VariantContent};
