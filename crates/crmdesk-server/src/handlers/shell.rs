//! Server-rendered page shell
//!
//! Every non-API path renders the same shell with the tenant's CSS custom
//! properties inlined in `<head>`, so the first paint is already themed.

use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
};

use super::resolve_theme;
use crate::app::AppState;
use crate::error::AppError;

#[derive(Template)]
#[template(path = "shell.html")]
struct ShellTemplate<'a> {
    app_name: &'a str,
    tenant: &'a str,
    theme_css: String,
    logo_url: Option<&'a str>,
    top_banner: Option<&'a str>,
    description: Option<&'a str>,
}

/// Fallback handler: `GET /` and any other non-API path
pub async fn shell(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let theme = resolve_theme(&state, &headers).await;

    let template = ShellTemplate {
        app_name: &state.config.theme.app_name,
        tenant: &theme.tenant,
        theme_css: theme.css(),
        logo_url: theme.logo_url.as_deref(),
        top_banner: theme.top_banner.as_deref(),
        description: theme.description.as_deref(),
    };

    Ok(Html(template.render()?).into_response())
}
