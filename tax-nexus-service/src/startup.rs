use crate::config::{ServiceConfig, StorageBackend};
use crate::handlers::{
    catalog, clients, dashboard, documents, export, fbr, health, invoices, sellers, tasks, users,
};
use crate::services::{BulkJobRegistry, MongoDb, Store};
use axum::{
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::{get, patch, post, put},
    Router,
};
use nexus_core::error::AppError;
use nexus_core::middleware::{
    make_request_span, metrics_middleware, request_id_middleware, security_headers_middleware,
};
use secrecy::ExposeSecret;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Store,
    pub jobs: BulkJobRegistry,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/services", get(catalog::list_services).post(catalog::create_service))
        .route(
            "/services/:id",
            get(catalog::get_service).delete(catalog::delete_service),
        )
        .route("/sellers", get(sellers::list_sellers).post(sellers::register_seller))
        .route(
            "/seller-settings",
            get(sellers::get_seller_settings).put(sellers::put_seller_settings),
        )
        .route(
            "/fbr-api-settings",
            get(fbr::get_fbr_settings).put(fbr::put_fbr_settings),
        )
        .route("/fbr-auth/status", get(fbr::fbr_auth_status))
        .route("/fbrinvoices/pending", get(fbr::list_pending))
        .route("/fbrinvoices/submissions", get(fbr::list_submissions))
        .route("/fbrinvoices/:id", put(fbr::update_submission))
        .route("/invoices", get(invoices::list_invoices).post(invoices::create))
        .route("/invoices/bulk", post(invoices::create_bulk))
        .route("/invoices/bulk/:job_id", get(invoices::get_bulk_job))
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invoices/:id/status", patch(invoices::update_status))
        .route("/invoices/:id/pdf", get(invoices::invoice_pdf))
        .route("/invoices/:id/qr", get(invoices::invoice_qr))
        .route("/documents/invoice-pdf", post(documents::render_posted_invoice))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/:id", put(tasks::update_task).delete(tasks::delete_task))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/meta/role-templates", get(users::role_templates))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/dashboard/stats", get(dashboard::dashboard_stats))
        .route("/export/excel", get(export::export_csv));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .nest("/api", api)
        .route_layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn build_store(config: &ServiceConfig) -> Result<Store, AppError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Store::in_memory())
        }
        StorageBackend::Mongo => {
            let db = MongoDb::connect(
                config.mongodb.uri.expose_secret(),
                &config.mongodb.database,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Store::mongo(db))
        }
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let store = build_store(&config).await?;
        let state = AppState {
            config: config.clone(),
            store,
            jobs: BulkJobRegistry::new(),
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            storage = config.storage.as_str(),
            "tax-nexus-service listening"
        );

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &Store {
        &self.state.store
    }

    /// Cancels in-flight bulk jobs when triggered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.jobs.shutdown_token()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
