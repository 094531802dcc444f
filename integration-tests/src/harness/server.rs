use crate::harness::fixture::Fixture;
use crate::harness::init_test_tracing;
use prism_core::cache::EnvLookup;
use prism_core::server::{Coordinator, ListenAddrs, ServerOptions, StaticServer};
use prism_core::setup::LoadedSetup;
use reqwest::blocking::{Client, RequestBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a running server bound to free localhost ports.
pub struct TestServer {
    server: StaticServer,
    addrs: ListenAddrs,
    base_url: String,
    client: Client,
}

impl TestServer {
    /// Start a server over the fixture, reading substitution values from `env`.
    pub fn start(fixture: &Fixture, env: &[(&str, &str)]) -> Self {
        Self::start_loaded(fixture.load(), env)
    }

    pub fn start_loaded(loaded: LoadedSetup, env: &[(&str, &str)]) -> Self {
        init_test_tracing();

        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let env: Arc<dyn EnvLookup> = Arc::new(env);
        let coordinator = Coordinator::new(loaded).with_env(env);
        let mut server = StaticServer::from_coordinator(coordinator).unwrap();

        let options = ServerOptions::http(format!("127.0.0.1:{}", free_port()))
            .with_threads(1)
            .without_preheat();
        let addrs = server.listen(options).expect("failed to start prism server");
        let base_url = format!("http://{}", addrs.http);

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build client");

        Self {
            server,
            addrs,
            base_url,
            client,
        }
    }

    /// Convenience helper for GET requests.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, path))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn addrs(&self) -> ListenAddrs {
        self.addrs
    }

    pub fn server(&self) -> &StaticServer {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut StaticServer {
        &mut self.server
    }

    pub fn close(&mut self) {
        self.server.close();
    }
}

/// Allocate a free port on localhost.
/// This is required to avoid port collisions when running tests in parallel.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
