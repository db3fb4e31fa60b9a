//! tax-nexus-service: the consolidated Tax Nexus REST backend.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;
