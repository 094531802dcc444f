use integration_tests::harness::server::free_port;
use integration_tests::harness::{TestAsset, Fixture, TestServer, access_events};
use pretty_assertions::assert_eq;
use prism_core::encoding::EncodingName;
use prism_core::server::{ServeError, ServerOptions, StaticServer};
use reqwest::StatusCode;
use std::net::TcpListener;

fn fixture() -> Fixture {
    Fixture::new()
        .asset(TestAsset::new("/file.js", "application/javascript", "'file content'\n"))
        .alias("/initial", "/file.js")
}

#[test]
fn update_setup_swaps_aliases() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, &[]);
    assert_eq!(srv.get("/other").send().unwrap().status(), StatusCode::NOT_FOUND);
    let next = fixture.alias("/other", "/file.js");

    // Act
    srv.server().update_setup(next.load()).unwrap();

    // Assert
    let res = srv.get("/other").send().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().unwrap(), "'file content'\n");
    assert_eq!(srv.get("/initial").send().unwrap().status(), StatusCode::OK);
}

#[test]
fn close_releases_the_port() {
    // Arrange
    let fixture = fixture();
    let mut srv = TestServer::start(&fixture, &[]);
    let addr = srv.addrs().http;

    // Act
    srv.close();

    // Assert
    assert!(!srv.server().is_listening());
    assert!(TcpListener::bind(addr).is_ok());
}

#[test]
fn busy_port_is_a_transport_error() {
    // Arrange
    let fixture = fixture();
    let busy = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = busy.local_addr().unwrap();
    let mut server = StaticServer::new(fixture.load()).unwrap();

    // Act
    let result = server.listen(ServerOptions::http(addr.to_string()));

    // Assert
    assert!(matches!(result, Err(ServeError::Transport { .. })));
    assert!(!server.is_listening());
}

#[test]
fn failing_preheat_aborts_listen() {
    // Arrange
    let fixture = fixture().asset(
        TestAsset::new("/env.js", "application/javascript", "__V__")
            .replace("__V__", "PRISM_TEST_NEVER_SET_ANYWHERE"),
    );
    let mut server = StaticServer::new(fixture.load()).unwrap();
    let port = free_port();

    // Act
    let result = server.listen(ServerOptions::http(format!("127.0.0.1:{port}")));

    // Assert
    assert!(matches!(result, Err(ServeError::Substitution(_))));
    assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
}

#[test]
fn disk_file_missing_is_500() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, &[]);
    std::fs::remove_file(fixture.rendering_path(EncodingName::Identity, "/file.js")).unwrap();

    // Act
    let res = srv.get("/file.js").send().unwrap();

    // Assert
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().unwrap(), "Internal server error\n");
}

#[test]
fn each_request_is_logged_once() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, &[]);

    // Act
    srv.get("/logged-once-probe?x=1")
        .header("User-Agent", "prism-test")
        .send()
        .unwrap();

    // Assert
    let events = access_events("/logged-once-probe");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.field("status"), Some("404"));
    assert_eq!(event.field("query"), Some("x=1"));
    assert_eq!(event.field("user_agent"), Some("prism-test"));
    assert_eq!(event.field("ip"), Some("127.0.0.1"));
    let line = event.field("message").unwrap();
    assert!(
        line.contains("\"GET /logged-once-probe?x=1 HTTP/1.1\" 404 10"),
        "unexpected access line: {line}"
    );
}
