//! `/api/*` passthrough to the CRM backend
//!
//! Requests are forwarded through the tracked transport, so an identical
//! call still in flight is answered with `409 Conflict` instead of reaching
//! the backend twice.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    response::Response,
};
use bytes::Bytes;
use crmdesk_egress::{OutboundRequest, RequestBody};
use crmdesk_observability::CallOutcome;
use tracing::debug;

use crate::app::AppState;
use crate::error::AppError;

/// Largest request body forwarded to the backend
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// `ANY /api/{*path}`
pub async fn proxy_api(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let url = backend_url(&state.config.backend.base_url, path_and_query);

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;

    let outbound = OutboundRequest {
        method: Some(parts.method.clone()),
        url,
        headers: forwarded_headers(&parts.headers),
        body: request_body(body),
    };

    debug!(method = %parts.method, url = %outbound.url, "Forwarding API request");

    let started = Instant::now();
    let result = state.backend.execute(outbound).await;
    let elapsed = started.elapsed().as_secs_f64();

    let upstream = match result {
        Ok(response) => {
            let outcome = CallOutcome::from_status(response.status.as_u16());
            state.metrics.record_outbound_call(outcome, elapsed);
            response
        }
        Err(e) => {
            if e.is_duplicate() {
                state.metrics.record_duplicate_blocked();
            } else {
                state
                    .metrics
                    .record_outbound_call(CallOutcome::TransportError, elapsed);
            }
            return Err(e.into());
        }
    };

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = filter_headers(&upstream.headers);

    Ok(response)
}

/// Join the backend base URL and the incoming path, keeping the query verbatim
fn backend_url(base_url: &str, path_and_query: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path_and_query.trim_start_matches('/')
    )
}

/// Text bodies keep their content so they take part in duplicate detection
fn request_body(body: Bytes) -> Option<RequestBody> {
    if body.is_empty() {
        return None;
    }

    match String::from_utf8(body.to_vec()) {
        Ok(text) => Some(RequestBody::Text(text)),
        Err(_) => Some(RequestBody::Bytes(body)),
    }
}

/// Client headers minus hop-by-hop, `host` and `content-length`
fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = filter_headers(headers);
    forwarded.remove(header::HOST);
    forwarded
}

fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for (name, value) in headers.iter() {
        if is_hop_by_hop_header(name.as_str()) || *name == header::CONTENT_LENGTH {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }

    filtered
}

/// Check if a header is a hop-by-hop header that should not be forwarded
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}
