use crate::config::ProxyConfig;
use crate::handlers::{health, relay};
use axum::{
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::{any, get},
    Router,
};
use nexus_core::error::AppError;
use nexus_core::middleware::{make_request_span, metrics_middleware, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct ProxyState {
    pub http: reqwest::Client,
    pub upstream_url: String,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            upstream_url: config.upstream_url.clone(),
        })
    }
}

/// Answers preflight itself and echoes the caller's origin, so cookies can
/// ride along.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route("/api", any(relay::relay))
        .route("/api/*path", any(relay::relay))
        .route_layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: ProxyConfig) -> Result<Self, AppError> {
        let state = ProxyState::new(&config)?;
        let app = router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, upstream = %config.upstream_url, "nexus-proxy listening");

        let server = axum::serve(listener, app);
        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
