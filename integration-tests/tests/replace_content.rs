use flate2::read::GzDecoder;
use integration_tests::harness::{TestAsset, Fixture, TestServer};
use pretty_assertions::assert_eq;
use prism_core::setup::LoadedSetup;
use reqwest::StatusCode;
use std::io::Read;
use std::thread;

const CONFIG_JS: &str = "window.config = { api: \"$API_URL\", name: \"[name]+\" };\n";

fn fixture() -> Fixture {
    Fixture::new()
        .asset(
            TestAsset::new("/config.js", "application/javascript", CONFIG_JS)
                .replace("$API_URL", "PRISM_TEST_API_URL")
                .replace("[name]+", "PRISM_TEST_NAME")
                .hash("v1"),
        )
        .asset(
            TestAsset::new("/broken.js", "application/javascript", "x = \"__X__\";\n")
                .replace("__X__", "PRISM_TEST_UNSET"),
        )
}

const ENV: &[(&str, &str)] = &[
    ("PRISM_TEST_API_URL", "https://api.example.test"),
    ("PRISM_TEST_NAME", "prism"),
];

const EXPECTED: &str = "window.config = { api: \"https://api.example.test\", name: \"prism\" };\n";

#[test]
fn tokens_are_replaced_literally() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, ENV);

    // Act
    let res = srv.get("/config.js").send().unwrap();

    // Assert
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-length"],
        EXPECTED.len().to_string().as_str()
    );
    assert_eq!(res.text().unwrap(), EXPECTED);
}

#[test]
fn substituted_content_is_recompressed() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, ENV);

    // Act
    let res = srv
        .get("/config.js")
        .header("Accept-Encoding", "gzip")
        .send()
        .unwrap();

    // Assert
    assert_eq!(res.headers()["content-encoding"], "gzip");
    assert_eq!(res.headers()["vary"], "Accept-Encoding");
    let body = res.bytes().unwrap();
    let mut text = String::new();
    GzDecoder::new(&body[..]).read_to_string(&mut text).unwrap();
    assert_eq!(text, EXPECTED);
}

#[test]
fn missing_environment_variable_is_500() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, ENV);

    // Act
    let res = srv.get("/broken.js").send().unwrap();
    let healthy = srv.get("/config.js").send().unwrap();

    // Assert
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["content-length"], "22");
    assert_eq!(res.text().unwrap(), "Internal server error\n");
    assert_eq!(healthy.status(), StatusCode::OK);
    let cache = srv.server().coordinator().generation().cache.clone();
    assert!(!cache.contains("/broken.js"));
    assert!(cache.contains("/config.js"));
}

#[test]
fn reloaded_setup_serves_fresh_content() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, ENV);
    assert_eq!(srv.get("/config.js").send().unwrap().text().unwrap(), EXPECTED);

    fixture.rewrite_identity("/config.js", "api = \"$API_URL\";\n");
    let mut loaded: LoadedSetup = fixture.load();
    loaded.setup.files[0].hash = Some("v2".to_string());

    // Act
    srv.server().update_setup(loaded).unwrap();
    let res = srv.get("/config.js").send().unwrap();

    // Assert
    assert_eq!(res.text().unwrap(), "api = \"https://api.example.test\";\n");
}

#[test]
fn concurrent_first_requests_share_one_fill() {
    // Arrange
    let fixture = fixture();
    let srv = TestServer::start(&fixture, ENV);
    let url = format!("{}/config.js", srv.base_url());

    // Act
    let bodies: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let url = url.clone();
                scope.spawn(move || reqwest::blocking::get(url).unwrap().text().unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Assert
    assert!(bodies.iter().all(|b| b == EXPECTED));
    assert_eq!(srv.server().coordinator().generation().cache.fill_count(), 1);
}
