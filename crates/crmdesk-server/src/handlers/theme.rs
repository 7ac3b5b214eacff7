//! Standalone tenant stylesheet

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};

use super::resolve_theme;
use crate::app::AppState;

/// `GET /theme.css`
pub async fn theme_css(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let theme = resolve_theme(&state, &headers).await;

    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        theme.css(),
    )
}
