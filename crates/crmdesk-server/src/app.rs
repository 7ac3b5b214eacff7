//! Application state and router assembly
//!
//! `AppState` carries the explicitly constructed services: one call tracker
//! shared by every backend call, the tracked transport wrapping the pooled
//! HTTP client, and the theme resolver.

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};
use crmdesk_egress::{CallTracker, HttpTransport, Transport};
use crmdesk_observability::{
    ComponentStatus, HealthState, Metrics, MetricsRefresher, ReadinessChecker, health_router,
};
use crmdesk_theme::{TenantVerifier, ThemeResolver};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Guards every call made through `backend`
    pub tracker: Arc<CallTracker>,
    /// Backend transport, already wrapped by `tracker`
    pub backend: Arc<dyn Transport>,
    pub themes: Arc<ThemeResolver>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the services from configuration
    pub fn from_config(
        config: ServerConfig,
        metrics: Arc<Metrics>,
    ) -> crmdesk_egress::Result<Self> {
        let http: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.backend.client)?);
        let tracker = Arc::new(CallTracker::new());

        // Verification stays untracked so concurrent renders of one tenant
        // are not rejected as duplicates of each other.
        let verifier = TenantVerifier::new(http.clone(), config.theme.verify_url.clone());
        let themes = ThemeResolver::new(verifier, config.theme.resolver_config());

        Ok(Self::new(config, tracker, http, themes, metrics))
    }

    /// Assemble state from pre-built parts; `transport` gets tracked here
    pub fn new(
        config: ServerConfig,
        tracker: Arc<CallTracker>,
        transport: Arc<dyn Transport>,
        themes: ThemeResolver,
        metrics: Arc<Metrics>,
    ) -> Self {
        let backend = tracker.install(transport);

        Self {
            config: Arc::new(config),
            tracker,
            backend,
            themes: Arc::new(themes),
            metrics,
        }
    }
}

/// Publishes the tracker's in-flight count at scrape time
struct ActiveCallsGauge(Arc<CallTracker>);

impl MetricsRefresher for ActiveCallsGauge {
    fn refresh(&self, metrics: &Metrics) {
        metrics.set_active_calls(self.0.active_calls_count());
    }
}

/// Ready once a backend and a verification endpoint are configured
struct ConfigReadiness {
    config: Arc<ServerConfig>,
    tracker: Arc<CallTracker>,
}

impl ReadinessChecker for ConfigReadiness {
    fn is_ready(&self) -> bool {
        !self.config.backend.base_url.is_empty() && !self.config.theme.verify_url.is_empty()
    }

    fn component_statuses(&self) -> Vec<ComponentStatus> {
        vec![
            ComponentStatus {
                name: "backend".to_string(),
                status: url_status(&self.config.backend.base_url),
                detail: Some(self.config.backend.base_url.clone()),
            },
            ComponentStatus {
                name: "tenant_verification".to_string(),
                status: url_status(&self.config.theme.verify_url),
                detail: Some(self.config.theme.verify_url.clone()),
            },
            ComponentStatus {
                name: "call_tracker".to_string(),
                status: "ok".to_string(),
                detail: Some(format!("{} active calls", self.tracker.active_calls_count())),
            },
        ]
    }
}

fn url_status(url: &str) -> String {
    let status = if url.is_empty() {
        "missing"
    } else {
        "configured"
    };
    status.to_string()
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let health_state = HealthState::new(state.metrics.clone())
        .with_readiness_checker(Arc::new(ConfigReadiness {
            config: state.config.clone(),
            tracker: state.tracker.clone(),
        }))
        .with_refresher(Arc::new(ActiveCallsGauge(state.tracker.clone())));

    let log_requests = state.config.logging.log_requests;

    let app = Router::new()
        .route("/theme.css", get(handlers::theme::theme_css))
        .route(
            "/internal/calls",
            get(handlers::calls::active_calls).delete(handlers::calls::clear_calls),
        )
        .route("/api/{*path}", any(handlers::proxy::proxy_api))
        .fallback(handlers::shell::shell)
        .with_state(state)
        .merge(health_router(health_state));

    if log_requests {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}
