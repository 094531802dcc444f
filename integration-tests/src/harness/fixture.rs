use prism_core::encoding::{EncodingName, compress};
use prism_core::setup::{LoadedSetup, load_setup};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One asset written to every requested rendering folder.
#[derive(Debug, Clone)]
pub struct TestAsset {
    pub path: String,
    pub mime: String,
    pub contents: Vec<u8>,
    pub encodings: Vec<EncodingName>,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub env_replacements: BTreeMap<String, String>,
    pub hash: Option<String>,
}

impl TestAsset {
    pub fn new(path: &str, mime: &str, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.to_string(),
            mime: mime.to_string(),
            contents: contents.into(),
            encodings: Vec::new(),
            status_code: 200,
            headers: BTreeMap::new(),
            env_replacements: BTreeMap::new(),
            hash: None,
        }
    }

    pub fn compressed(mut self, encodings: &[EncodingName]) -> Self {
        self.encodings = encodings.to_vec();
        self
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn replace(mut self, token: &str, var: &str) -> Self {
        self.env_replacements
            .insert(token.to_string(), var.to_string());
        self
    }

    pub fn hash(mut self, hash: &str) -> Self {
        self.hash = Some(hash.to_string());
        self
    }
}

/// A setup document plus its asset folders in a temporary directory.
pub struct Fixture {
    dir: TempDir,
    files: Vec<Value>,
    catch_all: Value,
    aliases: Vec<Value>,
    global_headers: Map<String, Value>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            files: Vec::new(),
            catch_all: Value::Null,
            aliases: Vec::new(),
            global_headers: Map::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn asset(mut self, asset: TestAsset) -> Self {
        let entry = self.write_asset(&asset);
        self.files.push(entry);
        self
    }

    pub fn catch_all(mut self, asset: TestAsset) -> Self {
        self.catch_all = self.write_asset(&asset);
        self
    }

    pub fn alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.push(json!({ "from": from, "to": to }));
        self
    }

    pub fn global_header(mut self, name: &str, value: &str) -> Self {
        self.global_headers
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    /// Path of a rendering inside the fixture.
    pub fn rendering_path(&self, encoding: EncodingName, path: &str) -> PathBuf {
        self.root()
            .join(encoding.as_str())
            .join(path.trim_start_matches('/'))
    }

    /// Overwrite the identity rendering of an asset without touching the setup.
    pub fn rewrite_identity(&self, path: &str, contents: &str) {
        fs::write(self.rendering_path(EncodingName::Identity, path), contents).unwrap();
    }

    pub fn setup_json(&self) -> Value {
        json!({
            "aliases": self.aliases,
            "folders": {
                "identity": "identity",
                "gzip": "gzip",
                "deflate": "deflate",
                "brotli": "brotli",
            },
            "files": self.files,
            "catchAllFile": self.catch_all,
            "globalHeaders": self.global_headers,
        })
    }

    /// Write `setup.json` and load it the way the binary does.
    pub fn load(&self) -> LoadedSetup {
        let path = self.root().join("setup.json");
        fs::write(&path, serde_json::to_vec_pretty(&self.setup_json()).unwrap()).unwrap();
        load_setup(&path).unwrap()
    }

    fn write_asset(&self, asset: &TestAsset) -> Value {
        let mut sizes = json!({
            "identity": asset.contents.len(),
            "gzip": null,
            "deflate": null,
            "brotli": null,
        });

        self.write_rendering(EncodingName::Identity, &asset.path, &asset.contents);
        for encoding in &asset.encodings {
            let data = compress(*encoding, &asset.contents).unwrap();
            self.write_rendering(*encoding, &asset.path, &data);
            sizes[encoding.as_str()] = json!(data.len());
        }

        json!({
            "path": asset.path,
            "mime": asset.mime,
            "statusCode": asset.status_code,
            "headers": asset.headers,
            "sizes": sizes,
            "envReplacements": asset.env_replacements,
            "hash": asset.hash,
        })
    }

    fn write_rendering(&self, encoding: EncodingName, path: &str, data: &[u8]) {
        let target = self.rendering_path(encoding, path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, data).unwrap();
    }
}
