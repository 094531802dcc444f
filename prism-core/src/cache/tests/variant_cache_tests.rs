use crate::cache::{EnvLookup, SubstitutionError, VariantCache};
use crate::encoding::EncodingName;
use crate::setup::{FileEntry, ServerSetup};
use crate::test_support::{file, setup};
use flate2::read::{GzDecoder, ZlibDecoder};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

const SCRIPT: &str = "window.API = \"__API_URL__\"; window.KEY = \"$KEY.*\";";

fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvLookup> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(map)
}

fn write_asset(root: &Path, relative: &str, contents: &str) {
    let path = root.join("files").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn replacing_file(path: &str) -> FileEntry {
    let mut f = file(path);
    f.mime = "application/javascript".to_string();
    f.env_replacements.insert("__API_URL__".to_string(), "API_URL".to_string());
    f.env_replacements.insert("$KEY.*".to_string(), "KEY".to_string());
    f
}

fn fixture() -> (TempDir, ServerSetup) {
    let dir = tempdir().unwrap();
    write_asset(dir.path(), "app.js", SCRIPT);
    let s = setup(vec![replacing_file("/app.js"), file("/plain.txt")]);
    (dir, s)
}

fn gunzip(data: &[u8]) -> String {
    let mut out = String::new();
    GzDecoder::new(data).read_to_string(&mut out).unwrap();
    out
}

fn inflate(data: &[u8]) -> String {
    let mut out = String::new();
    ZlibDecoder::new(data).read_to_string(&mut out).unwrap();
    out
}

fn unbrotli(data: &[u8]) -> String {
    let mut out = Vec::new();
    brotli::BrotliDecompress(&mut std::io::Cursor::new(data), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn file_without_replacements_passes_through_uncached() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[]));
    let plain = s.files[1].clone();

    // Act
    let resolved = cache.substitute(dir.path(), &s, plain.clone()).await.unwrap();

    // Assert
    assert_eq!(resolved.file, plain);
    assert!(resolved.content.is_none());
    assert!(cache.is_empty());
    assert_eq!(cache.fill_count(), 0);
}

#[tokio::test]
async fn substitutes_tokens_and_recomputes_sizes() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[("API_URL", "https://api.test"), ("KEY", "k1")]));
    let expected = "window.API = \"https://api.test\"; window.KEY = \"k1\";";

    // Act
    let resolved = cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();

    // Assert
    let entry = resolved.content.expect("substituted content");
    assert_eq!(&entry.content.identity[..], expected.as_bytes());
    assert_eq!(gunzip(&entry.content.gzip), expected);
    assert_eq!(inflate(&entry.content.deflate), expected);
    assert_eq!(unbrotli(&entry.content.brotli), expected);
    assert_eq!(resolved.file.sizes.identity, expected.len() as u64);
    assert_eq!(resolved.file.sizes.gzip, Some(entry.content.gzip.len() as u64));
    assert_eq!(
        resolved.file.sizes.get(EncodingName::Brotli),
        Some(entry.content.brotli.len() as u64)
    );
    assert!(cache.contains("/app.js"));
}

#[tokio::test]
async fn latin1_asset_is_substituted_byte_for_byte() {
    // Arrange
    let (dir, s) = fixture();
    fs::write(dir.path().join("files").join("app.js"), b"caf\xe9 = \"__API_URL__\";").unwrap();
    let cache = VariantCache::with_env(env(&[("API_URL", "https://api.test"), ("KEY", "k")]));

    // Act
    let resolved = cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();

    // Assert
    let expected: &[u8] = b"caf\xe9 = \"https://api.test\";";
    let entry = resolved.content.expect("substituted content");
    assert_eq!(&entry.content.identity[..], expected);
    let mut gzipped = Vec::new();
    GzDecoder::new(&entry.content.gzip[..])
        .read_to_end(&mut gzipped)
        .unwrap();
    assert_eq!(gzipped, expected);
    assert_eq!(resolved.file.sizes.identity, expected.len() as u64);
}

#[tokio::test]
async fn same_inputs_are_served_from_cache() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k")]));
    let first = cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();

    // Act
    write_asset(dir.path(), "app.js", "changed on disk");
    let second = cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();

    // Assert
    assert_eq!(cache.fill_count(), 1);
    assert!(Arc::ptr_eq(
        first.content.as_ref().unwrap(),
        second.content.as_ref().unwrap()
    ));
}

#[tokio::test]
async fn missing_env_var_fails_and_leaves_no_entry() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[("API_URL", "a")]));

    // Act
    let err = cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        SubstitutionError::MissingEnvVar { ref var, ref path } if var == "KEY" && path == "/app.js"
    ));
    assert!(!cache.contains("/app.js"));
    assert_eq!(cache.fill_count(), 0);
}

#[tokio::test]
async fn changed_hash_rebuilds_the_entry() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k")]));
    cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();
    write_asset(dir.path(), "app.js", "v2 __API_URL__");
    let mut changed = s.files[0].clone();
    changed.hash = Some("def".to_string());

    // Act
    let resolved = cache.substitute(dir.path(), &s, changed).await.unwrap();

    // Assert
    assert_eq!(cache.fill_count(), 2);
    assert_eq!(&resolved.content.unwrap().content.identity[..], b"v2 a");
}

#[tokio::test]
async fn changed_replacement_map_rebuilds_the_entry() {
    // Arrange
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k"), ("OTHER", "o")]));
    cache
        .substitute(dir.path(), &s, s.files[0].clone())
        .await
        .unwrap();
    let mut changed = s.files[0].clone();
    changed
        .env_replacements
        .insert("__API_URL__".to_string(), "OTHER".to_string());

    // Act
    let resolved = cache.substitute(dir.path(), &s, changed).await.unwrap();

    // Assert
    assert_eq!(cache.fill_count(), 2);
    let entry = resolved.content.unwrap();
    assert_eq!(
        &entry.content.identity[..],
        b"window.API = \"o\"; window.KEY = \"k\";"
    );
    assert_eq!(entry.env_replacements["__API_URL__"], "OTHER");
}

#[tokio::test]
async fn unreadable_source_fails_and_leaves_no_entry() {
    // Arrange
    let (dir, mut s) = fixture();
    s.files.push(replacing_file("/missing.js"));
    let cache = VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k")]));

    // Act
    let err = cache
        .substitute(dir.path(), &s, s.files[2].clone())
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, SubstitutionError::Read { .. }));
    assert!(!cache.contains("/missing.js"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_fill() {
    // Arrange
    let (dir, s) = fixture();
    let cache = Arc::new(VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k")])));
    let root = Arc::new(dir.path().to_path_buf());
    let s = Arc::new(s);

    // Act
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let cache = cache.clone();
        let root = root.clone();
        let s = s.clone();
        tasks.spawn(async move {
            cache
                .substitute(&root, &s, s.files[0].clone())
                .await
                .unwrap()
                .content
                .unwrap()
        });
    }
    let entries: Vec<_> = tasks.join_all().await;

    // Assert
    assert_eq!(cache.fill_count(), 1);
    assert_eq!(entries.len(), 16);
    assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
}

#[tokio::test]
async fn preheat_fills_every_replacing_file_including_catch_all() {
    // Arrange
    let (dir, mut s) = fixture();
    write_asset(dir.path(), "index.html", "<p>__API_URL__ $KEY.*</p>");
    let mut catch_all = replacing_file("/index.html");
    catch_all.mime = "text/html".to_string();
    s.catch_all_file = Some(catch_all);
    let cache = VariantCache::with_env(env(&[("API_URL", "a"), ("KEY", "k")]));

    // Act
    let substituted = cache.preheat(dir.path(), &s).await.unwrap();

    // Assert
    assert_eq!(substituted, 2);
    assert!(cache.contains("/app.js"));
    assert!(cache.contains("/index.html"));
    assert!(!cache.contains("/plain.txt"));
}

#[tokio::test]
async fn preheat_stops_at_first_failure() {
    let (dir, s) = fixture();
    let cache = VariantCache::with_env(env(&[]));

    let result = cache.preheat(dir.path(), &s).await;

    assert!(matches!(result, Err(SubstitutionError::MissingEnvVar { .. })));
}
