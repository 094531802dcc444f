use crate::cli::ServeArgs;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    serve: ServeArgs,
}

fn parse(args: &[&str]) -> ServeArgs {
    let argv = std::iter::once("prism").chain(args.iter().copied());
    TestCli::try_parse_from(argv).unwrap().serve
}

#[test]
fn defaults_listen_on_all_interfaces() {
    // Arrange
    let args = parse(&["setup.json", "--port", "9000"]);

    // Act
    let options = args.server_options();

    // Assert
    assert_eq!(options.http_addr, "0.0.0.0:9000");
    assert_eq!(options.https_addr, None);
    assert!(options.tls.is_none());
    assert!(options.preheat);
}

#[test]
fn missing_key_skips_https() {
    let dir = tempdir().unwrap();
    let cert = dir.path().join("cert.pem");
    fs::write(&cert, "cert").unwrap();
    let args = parse(&[
        "setup.json",
        "--https-port",
        "8443",
        "--https-cert",
        cert.to_str().unwrap(),
    ]);

    let options = args.server_options();

    assert!(options.tls.is_none());
    assert_eq!(options.https_addr, None);
}

#[test]
fn unreadable_cert_skips_https() {
    let dir = tempdir().unwrap();
    let key = dir.path().join("key.pem");
    fs::write(&key, "key").unwrap();
    let missing = dir.path().join("missing.pem");
    let args = parse(&[
        "setup.json",
        "--https-port",
        "8443",
        "--https-cert",
        missing.to_str().unwrap(),
        "--https-key",
        key.to_str().unwrap(),
    ]);

    let options = args.server_options();

    assert!(options.tls.is_none());
}

#[test]
fn readable_material_enables_https() {
    // Arrange
    let dir = tempdir().unwrap();
    let cert = dir.path().join("cert.pem");
    let key = dir.path().join("key.pem");
    fs::write(&cert, "cert").unwrap();
    fs::write(&key, "key").unwrap();
    let args = parse(&[
        "setup.json",
        "--host",
        "127.0.0.1",
        "--https-port",
        "8443",
        "--https-cert",
        cert.to_str().unwrap(),
        "--https-key",
        key.to_str().unwrap(),
        "--no-preheat",
        "--threads",
        "2",
    ]);

    // Act
    let options = args.server_options();

    // Assert
    assert_eq!(options.https_addr.as_deref(), Some("127.0.0.1:8443"));
    let tls = options.tls.unwrap();
    assert_eq!(tls.cert, b"cert");
    assert_eq!(tls.key, b"key");
    assert!(!options.preheat);
    assert_eq!(options.threads, Some(2));
}
