pub mod access_log;
pub mod cache;
pub mod cli;
pub mod encoding;
pub mod logging;
pub mod resolve;
pub mod server;
pub mod setup;

#[cfg(test)]
pub(crate) mod test_support;

pub use server::{ServerOptions, StaticServer};
pub use setup::{LoadedSetup, ServerSetup, load_setup};
