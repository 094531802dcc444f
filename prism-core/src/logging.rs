use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt};

/// Log format override: `PRISM_LOG_FORMAT=json|pretty`.
pub const LOG_FORMAT_ENV: &str = "PRISM_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Json,
    Pretty,
}

impl LogMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "raw" => Some(LogMode::Json),
            "pretty" => Some(LogMode::Pretty),
            _ => None,
        }
    }
}

pub fn default_log_mode() -> LogMode {
    if let Some(mode) = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|v| LogMode::parse(&v))
    {
        return mode;
    }

    if io::stdout().is_terminal() {
        LogMode::Pretty
    } else {
        LogMode::Json
    }
}

/// Initialize logging with environment-based filtering (`RUST_LOG`, default `info`).
///
/// JSON events are flattened so request log fields sit at the top level.
pub fn init_logging() {
    init_logging_with(default_log_mode());
}

pub fn init_logging_with(mode: LogMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        LogMode::Json => fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .init(),
        LogMode::Pretty => fmt().with_env_filter(filter).init(),
    }
}
