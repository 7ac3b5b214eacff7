//! Call tracker introspection

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct ActiveCallsResponse {
    pub active_calls: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearCallsResponse {
    pub cleared: usize,
}

/// `GET /internal/calls`
pub async fn active_calls(State(state): State<AppState>) -> Json<ActiveCallsResponse> {
    Json(ActiveCallsResponse {
        active_calls: state.tracker.active_calls_count(),
    })
}

/// `DELETE /internal/calls`
///
/// Only the bookkeeping is reset; calls still running are not cancelled.
pub async fn clear_calls(State(state): State<AppState>) -> Json<ClearCallsResponse> {
    let cleared = state.tracker.clear_active_calls();
    info!(cleared, "Active calls cleared via API");
    Json(ClearCallsResponse { cleared })
}
