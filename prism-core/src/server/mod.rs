mod app;
mod coordinator;
mod error;
mod lifecycle;
mod reload;
mod request;
mod response;
mod tls;


pub use app::StaticApp;
pub use coordinator::{Coordinator, Generation};
pub use error::ServeError;
pub use lifecycle::{ListenAddrs, ServerOptions, StaticServer};
pub use reload::{ReloadEvent, ReloadHandle, watch_setup};
pub use request::RequestInfo;
pub use response::{INTERNAL_ERROR_BODY, NOT_FOUND_BODY, StaticResponse};
pub use tls::{StagedTls, TlsMaterial, tls_settings};
