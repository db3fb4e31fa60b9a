//! nexus-proxy: forwards `/api/*` to the Tax Nexus backend so browsers can
//! call it first-party.
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod startup;
