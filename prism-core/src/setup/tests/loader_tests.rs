use crate::setup::{SetupError, load_setup};
use std::fs;
use tempfile::tempdir;

const SETUP: &str = r#"{
    "folders": { "identity": "files", "gzip": "gzip", "deflate": "deflate", "brotli": "brotli" },
    "files": [
        { "path": "/index.html", "mime": "text/html", "statusCode": 200, "sizes": { "identity": 10 } }
    ]
}"#;

#[test]
fn root_dir_is_the_setup_directory() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.json");
    fs::write(&path, SETUP).unwrap();

    // Act
    let loaded = load_setup(&path).unwrap();

    // Assert
    assert_eq!(loaded.root_dir, dir.path().canonicalize().unwrap());
    assert_eq!(loaded.setup.files[0].path, "/index.html");
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempdir().unwrap();

    let err = load_setup(&dir.path().join("nope.json")).unwrap_err();

    assert!(matches!(err, SetupError::ReadFile { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.json");
    fs::write(&path, "{ not json").unwrap();

    let err = load_setup(&path).unwrap_err();

    assert!(matches!(err, SetupError::Parse { .. }));
}

#[test]
fn invalid_setup_is_reported_with_its_path() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.json");
    fs::write(&path, r#"{ "folders": {} }"#).unwrap();

    // Act
    let err = load_setup(&path).unwrap_err();

    // Assert
    assert!(matches!(err, SetupError::Invalid { .. }));
    assert!(err.to_string().contains("setup.json"));
}
