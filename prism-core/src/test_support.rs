use crate::setup::{Alias, FileEntry, Folders, Headers, ServerSetup, Sizes};

pub(crate) fn file(path: &str) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        mime: "text/plain".to_string(),
        status_code: 200,
        headers: Headers::new(),
        sizes: Sizes {
            identity: 0,
            gzip: None,
            deflate: None,
            brotli: None,
        },
        env_replacements: Default::default(),
        hash: Some("abc".to_string()),
    }
}

pub(crate) fn alias(from: &str, to: &str) -> Alias {
    Alias {
        from: from.to_string(),
        to: to.to_string(),
    }
}

pub(crate) fn setup(files: Vec<FileEntry>) -> ServerSetup {
    ServerSetup {
        aliases: Vec::new(),
        folders: Folders {
            identity: "files".to_string(),
            gzip: "gzip".to_string(),
            deflate: "deflate".to_string(),
            brotli: "brotli".to_string(),
        },
        files,
        catch_all_file: None,
        global_headers: Headers::new(),
    }
}
