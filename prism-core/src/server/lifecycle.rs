use crate::server::app::StaticApp;
use crate::server::coordinator::Coordinator;
use crate::server::error::ServeError;
use crate::server::tls::{StagedTls, TlsMaterial, tls_settings};
use crate::setup::LoadedSetup;
use async_trait::async_trait;
use pingora::apps::http_app::HttpServer;
use pingora::server::configuration::ServerConf;
use pingora::server::{RunArgs, Server, ShutdownSignal, ShutdownSignalWatch};
use pingora::services::listening::Service;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const STARTUP_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub http_addr: String,
    pub https_addr: Option<String>,
    pub tls: Option<TlsMaterial>,
    /// Pingora worker threads. Pingora's default when unset.
    pub threads: Option<usize>,
    pub preheat: bool,
}

impl ServerOptions {
    pub fn http(addr: impl Into<String>) -> Self {
        Self {
            http_addr: addr.into(),
            https_addr: None,
            tls: None,
            threads: None,
            preheat: true,
        }
    }

    pub fn with_https(mut self, addr: impl Into<String>, tls: TlsMaterial) -> Self {
        self.https_addr = Some(addr.into());
        self.tls = Some(tls);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn without_preheat(mut self) -> Self {
        self.preheat = false;
        self
    }
}

/// Addresses actually bound by `listen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenAddrs {
    pub http: SocketAddr,
    pub https: Option<SocketAddr>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    thread: JoinHandle<()>,
    addrs: ListenAddrs,
    _tls: Option<StagedTls>,
}

/// A static asset server: one coordinator behind a plaintext and an optional TLS listener.
///
/// The synchronous methods drive a private control runtime and must not be called
/// from inside an async context. Use [`StaticServer::coordinator`] there instead.
pub struct StaticServer {
    coordinator: Arc<Coordinator>,
    control_rt: Runtime,
    preheat: bool,
    running: Option<Running>,
}

impl StaticServer {
    pub fn new(loaded: LoadedSetup) -> Result<Self, ServeError> {
        Self::from_coordinator(Coordinator::new(loaded))
    }

    pub fn from_coordinator(coordinator: Coordinator) -> Result<Self, ServeError> {
        let control_rt = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("prism-control")
            .enable_all()
            .build()
            .map_err(ServeError::Runtime)?;

        Ok(Self {
            coordinator: Arc::new(coordinator),
            control_rt,
            preheat: true,
            running: None,
        })
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        self.coordinator.clone()
    }

    pub fn addrs(&self) -> Option<ListenAddrs> {
        self.running.as_ref().map(|r| r.addrs)
    }

    pub fn is_listening(&self) -> bool {
        self.running.is_some()
    }

    /// Start both listeners and return once they accept connections.
    ///
    /// Preheats the cache first when enabled; a preheat failure aborts startup.
    pub fn listen(&mut self, options: ServerOptions) -> Result<ListenAddrs, ServeError> {
        if let Some(running) = &self.running {
            return Err(ServeError::transport(
                running.addrs.http.to_string(),
                "server is already listening",
            ));
        }

        self.preheat = options.preheat;
        if options.preheat {
            let substituted = self.control_rt.block_on(self.coordinator.preheat())?;
            tracing::info!(substituted, "cache preheated");
        }

        // Both probes stay bound until the server thread starts, so two `:0`
        // addresses never resolve to the same port.
        let http_probe = reserve(&options.http_addr)?;
        let tls = match (&options.https_addr, &options.tls) {
            (Some(addr), Some(material)) => {
                let https_probe = reserve(addr)?;
                Some((https_probe, StagedTls::stage(material)?))
            }
            (Some(addr), None) => {
                tracing::warn!(addr = %addr, "no TLS material, skipping HTTPS listener");
                None
            }
            (None, Some(_)) => {
                tracing::warn!("TLS material given without an HTTPS address, ignoring it");
                None
            }
            (None, None) => None,
        };

        let http = http_probe.addr;
        let addrs = ListenAddrs {
            http,
            https: tls.as_ref().map(|(probe, _)| probe.addr),
        };
        let plan = ServicePlan {
            coordinator: self.coordinator.clone(),
            threads: options.threads,
            http,
            https: tls.as_ref().map(|(probe, staged)| {
                (
                    probe.addr,
                    staged.cert_path().to_path_buf(),
                    staged.key_path().to_path_buf(),
                )
            }),
        };
        let tls = tls.map(|(_, staged)| staged);
        drop(http_probe);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let (built_tx, built_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("prism-server".to_string())
            .spawn(move || {
                let server = match plan.build() {
                    Ok(server) => server,
                    Err(err) => {
                        let _ = built_tx.send(Err(err));
                        return;
                    }
                };
                let _ = built_tx.send(Ok(()));

                let mut args = RunArgs::default();
                args.shutdown_signal = Box::new(WatchShutdown(shutdown_rx));
                server.run(args);
            })
            .map_err(|e| ServeError::transport(http.to_string(), e))?;

        let built = built_rx.recv().unwrap_or_else(|_| {
            Err(ServeError::transport(
                http.to_string(),
                "server thread exited",
            ))
        });
        if let Err(err) = built {
            let _ = thread.join();
            return Err(err);
        }

        let running = Running {
            shutdown,
            thread,
            addrs,
            _tls: tls,
        };

        if let Err(err) = wait_until_accepting(&running) {
            stop(running);
            return Err(err);
        }

        tracing::info!(
            http = %addrs.http,
            https = ?addrs.https,
            "listening"
        );
        self.running = Some(running);
        Ok(addrs)
    }

    /// Atomically replace the setup; the cache starts over.
    ///
    /// With preheat enabled an invalid new setup is rejected and the old one stays active.
    pub fn update_setup(&self, loaded: LoadedSetup) -> Result<(), ServeError> {
        self.control_rt
            .block_on(self.coordinator.install(loaded, self.preheat))
    }

    /// Stop both listeners. Returns once their ports are released.
    pub fn close(&mut self) {
        if let Some(running) = self.running.take() {
            let addrs = running.addrs;
            stop(running);
            tracing::info!(http = %addrs.http, "server closed");
        }
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.close();
    }
}

struct WatchShutdown(watch::Receiver<bool>);

#[async_trait]
impl ShutdownSignalWatch for WatchShutdown {
    async fn recv(&self) -> ShutdownSignal {
        let mut rx = self.0.clone();
        // A dropped sender also means shut down.
        let _ = rx.wait_for(|stop| *stop).await;
        ShutdownSignal::FastShutdown
    }
}

/// Everything the server thread needs to build the pingora server.
struct ServicePlan {
    coordinator: Arc<Coordinator>,
    threads: Option<usize>,
    http: SocketAddr,
    https: Option<(SocketAddr, PathBuf, PathBuf)>,
}

impl ServicePlan {
    fn build(self) -> Result<Server, ServeError> {
        let mut server = if let Some(threads) = self.threads {
            tracing::debug!(threads, "creating pingora server with overridden worker threads");
            let mut conf = ServerConf::new().ok_or_else(|| {
                ServeError::transport(self.http.to_string(), "invalid pingora server configuration")
            })?;
            conf.threads = threads;
            Server::new_with_opt_and_conf(None, conf)
        } else {
            Server::new(None).map_err(|e| ServeError::transport(self.http.to_string(), e))?
        };
        server.bootstrap();

        let mut service = Service::new(
            "prism static".to_string(),
            HttpServer::new_app(StaticApp::new(self.coordinator)),
        );
        service.add_tcp(&self.http.to_string());
        if let Some((https, cert, key)) = &self.https {
            let settings = tls_settings(cert, key)?;
            service.add_tls_with_settings(&https.to_string(), None, settings);
        }
        server.add_service(service);

        Ok(server)
    }
}

/// A bound address held open until pingora takes it over.
#[derive(Debug)]
pub(crate) struct Reservation {
    pub(crate) addr: SocketAddr,
    _listener: TcpListener,
}

/// Resolve `addr` and bind it, turning port 0 into a concrete port.
pub(crate) fn reserve(addr: &str) -> Result<Reservation, ServeError> {
    let resolved = addr
        .to_socket_addrs()
        .map_err(|e| ServeError::transport(addr, e))?
        .next()
        .ok_or_else(|| ServeError::transport(addr, "address did not resolve"))?;

    let listener = TcpListener::bind(resolved).map_err(|e| ServeError::transport(addr, e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServeError::transport(addr, e))?;
    Ok(Reservation {
        addr,
        _listener: listener,
    })
}

fn wait_until_accepting(running: &Running) -> Result<(), ServeError> {
    let targets = std::iter::once(running.addrs.http).chain(running.addrs.https);

    for addr in targets {
        let probe = connectable(addr);
        let deadline = Instant::now() + STARTUP_TIMEOUT;

        while TcpStream::connect_timeout(&probe, STARTUP_POLL).is_err() {
            if running.thread.is_finished() {
                return Err(ServeError::transport(addr.to_string(), "server exited during startup"));
            }
            if Instant::now() >= deadline {
                return Err(ServeError::transport(addr.to_string(), "listener did not start in time"));
            }
            std::thread::sleep(STARTUP_POLL);
        }
    }
    Ok(())
}

/// Wildcard binds are probed through loopback.
fn connectable(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V4(v4) if v4.ip().is_unspecified() => {
            SocketAddr::from(([127, 0, 0, 1], v4.port()))
        }
        SocketAddr::V6(v6) if v6.ip().is_unspecified() => {
            SocketAddr::from((std::net::Ipv6Addr::LOCALHOST, v6.port()))
        }
        other => other,
    }
}

fn stop(running: Running) {
    let _ = running.shutdown.send(true);
    if running.thread.join().is_err() {
        tracing::error!(http = %running.addrs.http, "server thread panicked");
    }
}
