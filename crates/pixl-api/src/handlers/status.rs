//! Admission status handler.
//!
//! Polled by clients to decide retry timing. Read-only: no side effects,
//! no queue position, just current load and a coarse wait estimate.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Status response for polling clients.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub active_processes: usize,
    /// Estimated wait in seconds (active jobs x average job cost)
    pub estimated_wait_time: u64,
}

/// Current admission state.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.admission.status();
    Json(StatusResponse {
        active_processes: snapshot.active_processes,
        estimated_wait_time: snapshot.estimated_wait_secs,
    })
}
