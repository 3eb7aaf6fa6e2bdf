//! Axum HTTP API server.
//!
//! This crate provides:
//! - Image and video job submission endpoints
//! - Admission status polling
//! - Security headers and body-size limits
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
