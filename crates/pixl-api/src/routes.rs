//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{get_status, health, submit_image, submit_video};
use crate::middleware::{cors_layer, request_id, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/image", post(submit_image))
        .route("/video", post(submit_video))
        .route("/status", get(get_status));

    let mut app = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health));

    if let Some(handle) = metrics_handle {
        app = app.route("/metrics", get(move || async move { handle.render() }));
    }

    let max_body = state.config.max_body_size;

    app.layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
