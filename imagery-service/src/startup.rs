use crate::config::ImageryConfig;
use crate::handlers;
use crate::services::providers::{ImageGenerator, OpenAiProvider, TextProvider};
use crate::services::sources::{
    ApodSource, ArtInstituteSource, ImageSource, JwstSource, NatureSource, StaticPool,
    UnsplashSource,
};
use crate::services::{
    DailyCacheManager, DescriptionGenerator, FallbackResolver, ImageDownloader, LocalStorage,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: ImageryConfig,
    pub storage: Arc<LocalStorage>,
    pub downloader: Arc<ImageDownloader>,
    pub describer: Arc<DescriptionGenerator>,
    pub resolver: Arc<FallbackResolver>,
    pub daily: Arc<DailyCacheManager>,
    pub text_provider: Arc<dyn TextProvider>,
    pub image_generator: Arc<dyn ImageGenerator>,
}

impl AppState {
    /// Wire every component around one shared HTTP client.
    pub async fn new(config: ImageryConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("imagery-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to create HTTP client: {}", e))
            })?;

        let storage = Arc::new(
            LocalStorage::new(&config.storage.data_dir)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.data_dir.display(),
                        e
                    );
                    e
                })?,
        );

        let openai = Arc::new(OpenAiProvider::new(client.clone(), config.openai.clone()));
        if let Err(e) = openai.health_check().await {
            tracing::warn!(error = %e, "Text provider unavailable; answers and descriptions will fail");
        }

        Ok(Self::with_providers(
            config,
            client,
            storage,
            openai.clone(),
            openai,
        ))
    }

    /// Build the state with explicit AI providers.
    pub fn with_providers(
        config: ImageryConfig,
        client: Client,
        storage: Arc<LocalStorage>,
        text_provider: Arc<dyn TextProvider>,
        image_generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let sources = &config.sources;
        let timeout = sources.timeout();

        let search: Arc<dyn ImageSource> = Arc::new(UnsplashSource::new(
            client.clone(),
            sources.unsplash.clone(),
            timeout,
        ));
        let jwst: Arc<dyn ImageSource> =
            Arc::new(JwstSource::new(client.clone(), sources.jwst.clone(), timeout));
        let art: Arc<dyn ImageSource> = Arc::new(ArtInstituteSource::new(
            client.clone(),
            sources.artic.clone(),
            timeout,
        ));
        let apod: Arc<dyn ImageSource> =
            Arc::new(ApodSource::new(client.clone(), sources.nasa.clone(), timeout));
        let nature: Arc<dyn ImageSource> = Arc::new(NatureSource::new(search.clone()));

        let downloader = Arc::new(ImageDownloader::new(
            client.clone(),
            storage.clone(),
            timeout,
        ));
        let describer = Arc::new(DescriptionGenerator::new(
            client,
            text_provider.clone(),
            config.openai.vision_model.clone(),
            config.openai.timeout(),
        ));

        let resolver = Arc::new(FallbackResolver::new(
            jwst,
            art.clone(),
            nature.clone(),
            search,
            StaticPool::default(),
        ));
        let daily = Arc::new(DailyCacheManager::new(
            storage.clone(),
            downloader.clone(),
            describer.clone(),
            apod,
            nature,
            art,
        ));

        Self {
            config,
            storage,
            downloader,
            describer,
            resolver,
            daily,
            text_provider,
            image_generator,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/ask", post(handlers::ask))
        .route("/api/search-image", post(handlers::search_image))
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/api/daily-images", get(handlers::daily_images))
        .route("/api/daily-images/:type", get(handlers::daily_image))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        // The browser client is served from a different origin.
        .layer(CorsLayer::permissive())
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: ImageryConfig) -> Result<Self, AppError> {
        let port = config.common.port;
        let state = AppState::new(config).await?;
        Self::with_state(state, port).await
    }

    /// Bind `port` (0 picks a free one) and serve `state`.
    pub async fn with_state(state: AppState, port: u16) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
