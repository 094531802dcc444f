use crate::server::coordinator::Coordinator;
use crate::setup::load_setup;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadEvent {
    pub epoch: u64,
}

/// Broadcasts requests to re-read the setup document.
///
/// Clones share one epoch counter; separate handles count independently.
#[derive(Clone)]
pub struct ReloadHandle {
    tx: watch::Sender<ReloadEvent>,
    epoch: Arc<AtomicU64>,
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHandle {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(ReloadEvent { epoch: 0 }),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn notify_reload(&self) -> ReloadEvent {
        let event = ReloadEvent {
            epoch: self.epoch.fetch_add(1, Ordering::Relaxed) + 1,
        };
        self.tx.send_replace(event);
        tracing::info!(epoch = event.epoch, "setup reload requested");
        event
    }

    /// Turn every SIGHUP into a reload request. Runs until the signal stream ends.
    #[cfg(unix)]
    pub async fn forward_sighup(&self) -> anyhow::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut hup = signal(SignalKind::hangup())?;
        while hup.recv().await.is_some() {
            tracing::info!("SIGHUP received");
            self.notify_reload();
        }
        Ok(())
    }
}

/// Re-read `setup_path` on every reload request and install it into `coordinator`.
///
/// A document that fails to load or preheat is logged and the running setup stays.
/// Returns when every `ReloadHandle` feeding `events` is dropped.
pub async fn watch_setup(
    mut events: watch::Receiver<ReloadEvent>,
    coordinator: Arc<Coordinator>,
    setup_path: PathBuf,
    preheat: bool,
) {
    while events.changed().await.is_ok() {
        let epoch = events.borrow_and_update().epoch;

        let installed = match load_setup(&setup_path) {
            Ok(loaded) => coordinator
                .install(loaded, preheat)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match installed {
            Ok(()) => tracing::info!(epoch, path = %setup_path.display(), "setup reloaded"),
            Err(error) => tracing::error!(
                epoch,
                path = %setup_path.display(),
                %error,
                "setup reload rejected, keeping current setup"
            ),
        }
    }
}
