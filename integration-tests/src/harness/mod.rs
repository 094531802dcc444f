pub mod fixture;
pub mod server;
pub mod tracing;

pub use fixture::{TestAsset, Fixture};
pub use server::TestServer;
pub use tracing::{CapturedEvent, access_events, init_test_tracing};
