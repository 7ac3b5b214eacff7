//! HTTP handlers

pub mod calls;
pub mod proxy;
pub mod shell;
pub mod theme;

use axum::http::{HeaderMap, header};
use crmdesk_theme::ResolvedTheme;

use crate::app::AppState;

/// Resolve the theme for the request's `Host` header and count the outcome
pub(crate) async fn resolve_theme(state: &AppState, headers: &HeaderMap) -> ResolvedTheme {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    let theme = state.themes.resolve(host).await;
    state.metrics.record_theme_resolution(theme.verified);
    theme
}
