//! nexus-client: the data-fetch layer for Tax Nexus front ends.
//!
//! Requests carry the bearer token and seller id held in an explicit
//! [`SessionStore`]; timeouts are retried once; 401/403 responses become
//! [`Redirect`] hints decided by the structured error code.
pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use api::{ApiClient, DownloadedFile};
pub use config::ClientConfig;
pub use error::{ClientError, Redirect};
pub use session::SessionStore;
