//! nexus-core: Shared infrastructure and domain contract for the Tax Nexus services.
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod retry;

pub use axum;
pub use mongodb;
pub use rust_decimal;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower_http;
pub use tracing;
pub use validator;
