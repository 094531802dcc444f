use crate::server::coordinator::Coordinator;
use crate::server::request::RequestInfo;
use async_trait::async_trait;
use http::Response;
use pingora::apps::http_app::ServeHttp;
use pingora::protocols::http::ServerSession;
use std::sync::Arc;

/// Pingora application shared by the plaintext and TLS endpoints.
pub struct StaticApp {
    coordinator: Arc<Coordinator>,
}

impl StaticApp {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl ServeHttp for StaticApp {
    async fn response(&self, http_session: &mut ServerSession) -> Response<Vec<u8>> {
        let ip = http_session
            .client_addr()
            .and_then(|addr| addr.as_inet())
            .map(|addr| addr.ip().to_string());
        let request = RequestInfo::from_parts(http_session.req_header(), ip);

        self.coordinator.handle(request).await.into_http()
    }
}
