use crate::server::error::ServeError;
use pingora::listeners::tls::TlsSettings;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// PEM-encoded certificate chain and private key.
#[derive(Clone)]
pub struct TlsMaterial {
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert", &format_args!("{} bytes", self.cert.len()))
            .field("key", &"<redacted>")
            .finish()
    }
}

impl TlsMaterial {
    pub fn new(cert: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }

    pub fn read(cert_path: &Path, key_path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            cert: std::fs::read(cert_path)?,
            key: std::fs::read(key_path)?,
        })
    }
}

/// TLS material written to a private directory for the lifetime of the listeners.
///
/// The acceptor loads PEM from paths; the directory is removed on drop.
#[derive(Debug)]
pub struct StagedTls {
    _dir: TempDir,
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl StagedTls {
    pub fn stage(material: &TlsMaterial) -> Result<Self, ServeError> {
        if material.cert.is_empty() || material.key.is_empty() {
            return Err(ServeError::tls("certificate and key must both be non-empty"));
        }

        let dir = tempfile::Builder::new()
            .prefix("prism-tls-")
            .tempdir()
            .map_err(|e| ServeError::tls(format!("cannot create staging directory: {e}")))?;
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");

        write_private(&cert_path, &material.cert)?;
        write_private(&key_path, &material.key)?;
        tracing::debug!(dir = %dir.path().display(), "TLS material staged");

        Ok(Self {
            _dir: dir,
            cert_path,
            key_path,
        })
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

/// Acceptor settings offering `h2` and `http/1.1` through ALPN.
pub fn tls_settings(cert_path: &Path, key_path: &Path) -> Result<TlsSettings, ServeError> {
    let cert = path_str(cert_path)?;
    let key = path_str(key_path)?;

    let mut settings = TlsSettings::intermediate(cert, key).map_err(ServeError::tls)?;
    settings.enable_h2();
    Ok(settings)
}

fn write_private(path: &Path, contents: &[u8]) -> Result<(), ServeError> {
    std::fs::write(path, contents)
        .map_err(|e| ServeError::tls(format!("cannot stage {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| ServeError::tls(format!("cannot restrict {}: {e}", path.display())))?;
    }

    Ok(())
}

fn path_str(path: &Path) -> Result<&str, ServeError> {
    path.to_str()
        .ok_or_else(|| ServeError::tls(format!("non UTF-8 staging path {}", path.display())))
}
