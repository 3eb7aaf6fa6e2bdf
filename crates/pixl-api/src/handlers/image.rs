//! Image job submission.

use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use pixl_models::ImageJob;

use crate::error::{ApiError, ApiResult};
use crate::handlers::caller_identity;
use crate::metrics;
use crate::state::AppState;

/// Image submission request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// Inline payload as a data URL
    pub image: String,
    /// Tolerant of strings and junk values; invalid heights fall back to
    /// the default rendition height downstream
    #[serde(default, deserialize_with = "crate::handlers::lenient_height")]
    pub target_height: Option<u32>,
}

/// Successful transform response.
#[derive(Serialize)]
pub struct ImageResponse {
    /// Base64-encoded rendition bytes
    pub result: String,
    pub mime: String,
    pub cached: bool,
}

/// Submit an image pixelation job.
pub async fn submit_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ImageRequest>,
) -> ApiResult<Response> {
    let started = Instant::now();
    let identity = caller_identity(&headers);

    let decision = state.admission.check(identity.as_deref());
    if !decision.allowed {
        return Err(if decision.busy {
            ApiError::Busy
        } else {
            ApiError::RateLimited
        });
    }

    let job = ImageJob::new(req.image, req.target_height);

    // Validation happens before a job slot is allocated
    let validated = state.images.validate(&job)?;
    let source_mime = validated.format().mime();
    let (width, height) = validated.dimensions();

    // The guard releases the slot on every exit path, including errors
    let _slot = state.admission.start_process();
    let output = state.images.execute(validated).await?;

    metrics::record_transform("image", output.cached, started.elapsed().as_secs_f64());
    info!(
        identity = identity.as_deref().unwrap_or("unknown"),
        source_mime,
        width,
        height,
        elapsed_ms = started.elapsed().as_millis() as u64,
        output_bytes = output.bytes.len(),
        cached = output.cached,
        "Image job completed"
    );

    let body = ImageResponse {
        result: BASE64.encode(&output.bytes),
        mime: output.mime,
        cached: output.cached,
    };

    let mut response = Json(body).into_response();
    if let Ok(value) = decision.remaining.to_string().parse() {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    Ok(response)
}
