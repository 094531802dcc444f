pub mod serve;
pub mod setup;

#[cfg(test)]
mod tests;

pub use serve::ServeArgs;
pub use setup::SetupCmd;
