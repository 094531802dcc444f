use crate::setup::error::ValidationError;
use crate::setup::types::{Alias, FileEntry, Folders, Headers, ServerSetup, Sizes};
use serde_json::{Map, Value};

/// Validate an untyped setup document into a [`ServerSetup`].
///
/// Absent optional collections become empty and absent size entries become
/// `None`. The function is pure: it never touches the filesystem.
pub fn validate_setup(raw: &Value) -> Result<ServerSetup, ValidationError> {
    let root = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let folders = match root.get("folders") {
        Some(Value::Object(folders)) => folders,
        _ => return Err(ValidationError::MissingFolders),
    };

    let setup = ServerSetup {
        aliases: validate_aliases(optional(root, "aliases"))?,
        folders: Folders {
            identity: required_string(folders, "identity", "folders.identity")?,
            gzip: required_string(folders, "gzip", "folders.gzip")?,
            deflate: required_string(folders, "deflate", "folders.deflate")?,
            brotli: required_string(folders, "brotli", "folders.brotli")?,
        },
        files: validate_files(optional(root, "files"))?,
        catch_all_file: optional(root, "catchAllFile")
            .map(|file| validate_file(file, "catchAllFile"))
            .transpose()?,
        global_headers: validate_string_map(optional(root, "globalHeaders"), "globalHeaders")?,
    };

    if setup.files.is_empty() && setup.catch_all_file.is_none() {
        return Err(ValidationError::NoFiles);
    }

    Ok(setup)
}

/// A key that is missing and a key that is `null` are the same thing.
fn optional<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn required_string(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<String, ValidationError> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ValidationError::not_string(field)),
    }
}

fn validate_aliases(value: Option<&Value>) -> Result<Vec<Alias>, ValidationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let list = value.as_array().ok_or_else(|| ValidationError::NotList {
        field: "aliases".to_string(),
    })?;

    list.iter()
        .enumerate()
        .map(|(i, alias)| {
            let field = format!("aliases[{i}]");
            let object = alias
                .as_object()
                .ok_or_else(|| ValidationError::InvalidAlias {
                    field: field.clone(),
                })?;

            match (object.get("from"), object.get("to")) {
                (Some(Value::String(from)), Some(Value::String(to))) => Ok(Alias {
                    from: from.clone(),
                    to: to.clone(),
                }),
                _ => Err(ValidationError::InvalidAlias { field }),
            }
        })
        .collect()
}

fn validate_files(value: Option<&Value>) -> Result<Vec<FileEntry>, ValidationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let list = value.as_array().ok_or_else(|| ValidationError::NotList {
        field: "files".to_string(),
    })?;

    list.iter()
        .enumerate()
        .map(|(i, file)| validate_file(file, &format!("files[{i}]")))
        .collect()
}

fn validate_file(value: &Value, field: &str) -> Result<FileEntry, ValidationError> {
    let object = value.as_object().ok_or_else(|| ValidationError::NotObject {
        field: field.to_string(),
    })?;

    let path = required_string(object, "path", &format!("{field}.path"))?;
    if !path.starts_with('/') {
        return Err(ValidationError::RelativePath {
            field: format!("{field}.path"),
        });
    }

    let mime = required_string(object, "mime", &format!("{field}.mime"))?;
    if mime.is_empty() {
        return Err(ValidationError::EmptyMime {
            field: format!("{field}.mime"),
        });
    }

    let status_field = format!("{field}.statusCode");
    let status = object
        .get("statusCode")
        .and_then(as_integer)
        .ok_or_else(|| ValidationError::not_integer(&status_field))?;
    let status_code = u16::try_from(status)
        .ok()
        .filter(|code| *code > 0)
        .ok_or(ValidationError::InvalidStatusCode {
            field: status_field,
            value: status,
        })?;

    let sizes = match object.get("sizes") {
        Some(Value::Object(sizes)) => validate_sizes(sizes, &format!("{field}.sizes"))?,
        _ => {
            return Err(ValidationError::NotObject {
                field: format!("{field}.sizes"),
            });
        }
    };

    let hash = match optional(object, "hash") {
        None => None,
        Some(Value::String(hash)) => Some(hash.clone()),
        Some(_) => return Err(ValidationError::not_string(format!("{field}.hash"))),
    };

    Ok(FileEntry {
        path,
        mime,
        status_code,
        headers: validate_string_map(optional(object, "headers"), &format!("{field}.headers"))?,
        sizes,
        env_replacements: validate_string_map(
            optional(object, "envReplacements"),
            &format!("{field}.envReplacements"),
        )?,
        hash,
    })
}

fn validate_sizes(sizes: &Map<String, Value>, field: &str) -> Result<Sizes, ValidationError> {
    let identity_field = format!("{field}.identity");
    let identity = sizes
        .get("identity")
        .and_then(as_size)
        .ok_or_else(|| ValidationError::not_integer(identity_field))?;

    let variant = |key: &str| -> Result<Option<u64>, ValidationError> {
        match optional(sizes, key) {
            None => Ok(None),
            Some(v) => as_size(v)
                .map(Some)
                .ok_or_else(|| ValidationError::not_integer(format!("{field}.{key}"))),
        }
    };

    Ok(Sizes {
        identity,
        gzip: variant("gzip")?,
        deflate: variant("deflate")?,
        brotli: variant("brotli")?,
    })
}

fn validate_string_map(value: Option<&Value>, field: &str) -> Result<Headers, ValidationError> {
    let Some(value) = value else {
        return Ok(Headers::new());
    };

    let invalid = || ValidationError::InvalidHeaders {
        field: field.to_string(),
    };

    value
        .as_object()
        .ok_or_else(invalid)?
        .iter()
        .map(|(key, v)| match v {
            Value::String(s) => Ok((key.clone(), s.clone())),
            _ => Err(invalid()),
        })
        .collect()
}

/// Integral JSON numbers, including floats without a fractional part (`200.0`).
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(i);
    }

    let f = number.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn as_size(value: &Value) -> Option<u64> {
    as_integer(value).and_then(|i| u64::try_from(i).ok())
}
