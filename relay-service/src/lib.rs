pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod utils;

use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use services::providers::ChatProvider;
use services::{GeminiClient, OpenAiClient, PlacesClient, ProviderChain};

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub providers: ProviderChain,
    pub gemini: Arc<GeminiClient>,
    pub places: PlacesClient,
}

impl AppState {
    /// Wires every upstream client from the configuration. Chat providers are
    /// ordered Gemini first, then OpenAI.
    pub fn new(config: RelayConfig) -> Self {
        let client = reqwest::Client::new();

        let gemini = Arc::new(GeminiClient::new(client.clone(), config.gemini.clone()));
        let openai = Arc::new(OpenAiClient::new(client.clone(), config.openai.clone()));
        let providers = ProviderChain::new(vec![
            gemini.clone() as Arc<dyn ChatProvider>,
            openai as Arc<dyn ChatProvider>,
        ]);
        let places = PlacesClient::new(client, config.google_maps.clone());

        Self {
            config: Arc::new(config),
            providers,
            gemini,
            places,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::diagnostics::health_check))
        .route("/metrics", get(handlers::diagnostics::metrics))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/places", get(handlers::places::search_places))
        .route("/get-photo-url", get(handlers::places::photo_url))
        .route("/api/place-details", get(handlers::places::place_details))
        .route("/api/test-gemini", post(handlers::diagnostics::test_gemini))
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
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Binds the listener (port 0 picks a random port) and builds the router.
    pub async fn build(config: RelayConfig) -> anyhow::Result<Self> {
        let services = config.services();
        tracing::info!(
            gemini = services.gemini,
            openai = services.openai,
            google_maps = services.google_maps,
            "Upstream integrations configured"
        );
        if !services.gemini && !services.openai {
            tracing::warn!("No chat provider configured - /api/chat will return 500");
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            e
        })?;
        let port = listener.local_addr()?.port();

        let router = build_router(AppState::new(config));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Relay listening on port {}", self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
