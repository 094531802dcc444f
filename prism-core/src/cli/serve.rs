use crate::server::{ReloadHandle, ServerOptions, StaticServer, TlsMaterial, watch_setup};
use crate::setup::load_setup;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::mpsc;
use tokio::runtime::Builder;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Path to the setup document
    pub setup: PathBuf,

    /// Plaintext HTTP port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// HTTPS port, used when a certificate and key are available
    #[arg(long, env = "HTTPS_PORT")]
    pub https_port: Option<u16>,

    /// PEM certificate chain for HTTPS
    #[arg(long, env = "HTTPS_CERT")]
    pub https_cert: Option<PathBuf>,

    /// PEM private key for HTTPS
    #[arg(long, env = "HTTPS_KEY")]
    pub https_key: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Pingora worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Substitute environment values on first request instead of at startup
    #[arg(long)]
    pub no_preheat: bool,
}

impl ServeArgs {
    /// Listener options. HTTPS is skipped, with a log line, when certificate,
    /// key or port are missing or the files cannot be read.
    pub fn server_options(&self) -> ServerOptions {
        let mut options = ServerOptions::http(format!("{}:{}", self.host, self.port));
        options.threads = self.threads;
        options.preheat = !self.no_preheat;

        let (Some(cert), Some(key)) = (&self.https_cert, &self.https_key) else {
            tracing::info!("HTTPS_CERT and HTTPS_KEY are missing, skipping HTTPS setup");
            return options;
        };
        let Some(https_port) = self.https_port else {
            tracing::info!("HTTPS_PORT is missing, skipping HTTPS setup");
            return options;
        };

        match TlsMaterial::read(cert, key) {
            Ok(material) => {
                options.with_https(format!("{}:{}", self.host, https_port), material)
            }
            Err(e) => {
                tracing::warn!(
                    cert = %cert.display(),
                    key = %key.display(),
                    error = %e,
                    "could not read HTTPS certificate or key, skipping HTTPS setup"
                );
                options
            }
        }
    }
}

/// Run the server until SIGINT or SIGTERM. SIGHUP re-reads the setup document.
pub fn run(args: ServeArgs) -> Result<()> {
    let loaded = load_setup(&args.setup)
        .with_context(|| format!("cannot load setup {}", args.setup.display()))?;
    let options = args.server_options();
    let preheat = options.preheat;

    let mut server = StaticServer::new(loaded)?;
    let addrs = server.listen(options).context("failed to start server")?;
    tracing::info!(port = addrs.http.port(), "server running");
    if let Some(https) = addrs.https {
        tracing::info!(port = https.port(), "server running as HTTPS");
    }

    // Control-plane runtime (signals + reload only)
    let control_rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to build control-plane Tokio runtime")?;

    let reload = ReloadHandle::new();

    #[cfg(unix)]
    control_rt.spawn({
        let reload = reload.clone();
        async move {
            if let Err(e) = reload.forward_sighup().await {
                tracing::error!(error = %e, "cannot install SIGHUP handler");
            }
        }
    });
    control_rt.spawn(watch_setup(
        reload.subscribe(),
        server.coordinator(),
        args.setup.clone(),
        preheat,
    ));

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("failed to install shutdown handler")?;

    let _ = stop_rx.recv();
    tracing::info!("shutdown requested");
    server.close();
    control_rt.shutdown_background();

    Ok(())
}
