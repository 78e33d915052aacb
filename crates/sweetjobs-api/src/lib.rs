//! Axum HTTP API server for the SweetJobs job board.
//!
//! This crate provides:
//! - Localized CRUD routes for every translatable resource
//! - Job owner and event routes authenticated by bearer JWT
//! - Upload storage and best-effort notification mail
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod mail;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AccessGate, AdminUser, Identity};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use files::{FileStore, LocalFileStore};
pub use mail::MailTransport;
pub use routes::create_router;
pub use services::{EventService, LocalizedService, UserService};
pub use state::AppState;
