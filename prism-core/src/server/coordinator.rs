use crate::access_log::{RequestLog, RequestLogger, TracingRequestLogger};
use crate::cache::{EnvLookup, ProcessEnv, Resolved, VariantCache};
use crate::encoding::{EncodingName, parse_accept_encoding, select_variant};
use crate::resolve::{FileProvider, SetupFiles, SetupProvider, resolve_entry};
use crate::server::error::ServeError;
use crate::server::request::RequestInfo;
use crate::server::response::StaticResponse;
use crate::setup::{LoadedSetup, ServerSetup};
use arc_swap::ArcSwap;
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// One installed setup together with the cache built for it.
///
/// Requests load a generation once and use it for their whole lifetime.
pub struct Generation {
    pub root_dir: PathBuf,
    pub setup: Arc<ServerSetup>,
    pub cache: Arc<VariantCache>,
}

impl Generation {
    fn new(loaded: LoadedSetup, env: Arc<dyn EnvLookup>) -> Self {
        Self {
            root_dir: loaded.root_dir,
            setup: Arc::new(loaded.setup),
            cache: Arc::new(VariantCache::with_env(env)),
        }
    }
}

/// Turns requests into responses against the current generation.
///
/// Shared by every listener of a server.
pub struct Coordinator {
    generation: ArcSwap<Generation>,
    env: Arc<dyn EnvLookup>,
    setup_provider: Option<Arc<dyn SetupProvider>>,
    file_provider: Arc<dyn FileProvider>,
    logger: Arc<dyn RequestLogger>,
}

impl Coordinator {
    pub fn new(loaded: LoadedSetup) -> Self {
        let env: Arc<dyn EnvLookup> = Arc::new(ProcessEnv);
        Self {
            generation: ArcSwap::from_pointee(Generation::new(loaded, env.clone())),
            env,
            setup_provider: None,
            file_provider: Arc::new(SetupFiles),
            logger: Arc::new(TracingRequestLogger),
        }
    }

    /// Read substitution values from `env` instead of the process environment.
    pub fn with_env(mut self, env: Arc<dyn EnvLookup>) -> Self {
        let current = self.generation.load_full();
        self.generation = ArcSwap::from_pointee(Generation {
            root_dir: current.root_dir.clone(),
            setup: current.setup.clone(),
            cache: Arc::new(VariantCache::with_env(env.clone())),
        });
        self.env = env;
        self
    }

    pub fn with_setup_provider(mut self, provider: Arc<dyn SetupProvider>) -> Self {
        self.setup_provider = Some(provider);
        self
    }

    pub fn with_file_provider(mut self, provider: Arc<dyn FileProvider>) -> Self {
        self.file_provider = provider;
        self
    }

    pub fn with_request_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn generation(&self) -> Arc<Generation> {
        self.generation.load_full()
    }

    /// Substitute every replacing file of the current generation.
    pub async fn preheat(&self) -> Result<usize, ServeError> {
        let generation = self.generation.load_full();
        let substituted = generation
            .cache
            .preheat(&generation.root_dir, &generation.setup)
            .await?;
        Ok(substituted)
    }

    /// Install a new setup with an empty cache.
    ///
    /// With `preheat`, the new cache is filled before the swap and a failure
    /// leaves the current generation in place.
    pub async fn install(&self, loaded: LoadedSetup, preheat: bool) -> Result<(), ServeError> {
        let next = Generation::new(loaded, self.env.clone());
        if preheat {
            next.cache.preheat(&next.root_dir, &next.setup).await?;
        }

        let files = next.setup.files.len();
        let aliases = next.setup.aliases.len();
        let previous = self.generation.swap(Arc::new(next));
        tracing::info!(
            files,
            aliases,
            previous_files = previous.setup.files.len(),
            previous_cached = previous.cache.len(),
            "setup installed"
        );
        Ok(())
    }

    /// Answer one request and log it.
    ///
    /// Never fails: errors become a 500 response and are only logged.
    pub async fn handle(&self, request: RequestInfo) -> StaticResponse {
        let request_time = Utc::now();

        let response = match self.respond(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(path = %request.path, error = %err, "request failed");
                StaticResponse::internal_error()
            }
        };

        self.logger.log(&RequestLog {
            ip: request.ip,
            user: None,
            method: request.method,
            path: request.path,
            query_string: request.query,
            protocol: request.protocol,
            status_code: response.status,
            response_size: Some(response.body.len() as u64),
            referer: request.referer,
            user_agent: request.user_agent,
            request_time,
            response_time: Utc::now(),
        });

        response
    }

    pub async fn respond(&self, request: &RequestInfo) -> Result<StaticResponse, ServeError> {
        let generation = self.request_generation().await?;
        let encodings = parse_accept_encoding(request.accept_encoding.as_deref());

        let Some(file) =
            resolve_entry(&generation.setup, self.file_provider.as_ref(), &request.path).await?
        else {
            return Ok(StaticResponse::not_found());
        };

        let resolved = generation
            .cache
            .substitute(&generation.root_dir, &generation.setup, file)
            .await?;
        let variant = select_variant(&encodings, &resolved.file.sizes);
        tracing::debug!(
            path = %request.path,
            file = %resolved.file.path,
            encoding = %variant.encoding,
            size = variant.size,
            cached = resolved.content.is_some(),
            "variant selected"
        );

        let body = read_variant(&generation, &resolved, variant.encoding).await?;
        Ok(StaticResponse::asset(
            &generation.setup,
            &resolved.file,
            variant.encoding,
            body,
        ))
    }

    async fn request_generation(&self) -> Result<Arc<Generation>, ServeError> {
        let current = self.generation.load_full();
        let Some(provider) = &self.setup_provider else {
            return Ok(current);
        };

        let loaded = provider
            .current()
            .await
            .map_err(|e| ServeError::provider(&e))?;
        Ok(Arc::new(Generation {
            root_dir: loaded.root_dir,
            setup: Arc::new(loaded.setup),
            cache: current.cache.clone(),
        }))
    }
}

async fn read_variant(
    generation: &Generation,
    resolved: &Resolved,
    encoding: EncodingName,
) -> Result<Bytes, ServeError> {
    if let Some(entry) = &resolved.content {
        return Ok(entry.content.get(encoding).clone());
    }

    let path = generation
        .root_dir
        .join(generation.setup.folders.for_encoding(encoding))
        .join(resolved.file.relative_path());
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ServeError::io(path, e))?;
    Ok(Bytes::from(data))
}
