//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared upstream HTTP client once
//! - Create the Axum router with all relay handlers
//! - Wire up middleware (tracing, request ID, CORS, limits, timeout, metrics)
//! - Serve until the shutdown signal fires

use axum::{extract::DefaultBodyLimit, middleware, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api::setup_api_router;
use crate::config::{DownloadConfig, RelayConfig};
use crate::generation::GenerationClient;
use crate::http::request::{propagate_request_id, request_span, set_request_id};
use crate::observability::metrics;
use crate::security::cors_layer;
use crate::tableau::client::redirect_policy;
use crate::tableau::TableauClient;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub tableau: TableauClient,
    pub generation: GenerationClient,
    pub downloads: DownloadConfig,
}

impl AppState {
    /// Build state around one pooled `reqwest::Client`.
    pub fn from_config(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.upstream.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .redirect(redirect_policy());
        if !config.upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            tableau: TableauClient::new(http.clone(), config.tableau.clone(), &config.downloads),
            generation: GenerationClient::new(http, config.generation.endpoint.clone()),
            downloads: config.downloads.clone(),
        })
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prebuilt state.
    pub fn with_state(config: RelayConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        setup_api_router(state)
            .route_layer(middleware::from_fn(metrics::track_requests))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(propagate_request_id())
                    .layer(cors_layer(&config.cors))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_concurrent_downloads = self.config.downloads.max_concurrent,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
