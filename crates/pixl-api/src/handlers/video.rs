//! Video job submission.

use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use pixl_models::data_url::to_data_url;
use pixl_models::VideoJob;

use crate::error::{ApiError, ApiResult};
use crate::handlers::caller_identity;
use crate::metrics;
use crate::state::AppState;

/// Video submission request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    /// Inline payload as a data URL
    pub video: String,
    /// Tolerant of strings and junk values; invalid heights fall back to
    /// the default rendition height downstream
    #[serde(default, deserialize_with = "crate::handlers::lenient_height")]
    pub target_height: Option<u32>,
    #[serde(default)]
    pub preserve_audio: bool,
}

/// Successful transform response.
#[derive(Serialize)]
pub struct VideoResponse {
    /// Rendition as a data URL
    pub result: String,
    pub mime: String,
    pub cached: bool,
}

/// Submit a video downscale job.
pub async fn submit_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VideoRequest>,
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

    let job = VideoJob::new(req.video, req.target_height, req.preserve_audio);

    // Validation happens before a job slot is allocated
    let validated = state.videos.validate(&job)?;
    let source_mime = validated.format().mime();
    let original_bytes = validated.payload_len();

    // The guard releases the slot on every exit path; the pipeline removes
    // its scratch files on every exit path as well
    let _slot = state.admission.start_process();
    let output = state.videos.execute(validated).await?;

    metrics::record_transform("video", output.cached, started.elapsed().as_secs_f64());
    info!(
        identity = identity.as_deref().unwrap_or("unknown"),
        source_mime,
        original_bytes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        output_bytes = output.bytes.len(),
        cached = output.cached,
        preserve_audio = req.preserve_audio,
        "Video job completed"
    );

    let body = VideoResponse {
        result: to_data_url(&output.mime, &output.bytes),
        mime: output.mime,
        cached: output.cached,
    };

    let mut response = Json(body).into_response();
    if let Ok(value) = decision.remaining.to_string().parse() {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    Ok(response)
}
