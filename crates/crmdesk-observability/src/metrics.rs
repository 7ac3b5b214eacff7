//! Metrics collection with Prometheus
//!
//! Prometheus metrics for CRMDesk:
//! - Outbound call counts by outcome and duration histogram
//! - Duplicate calls blocked by the call tracker
//! - Active outbound calls (gauge, refreshed at scrape time)
//! - Theme resolutions by outcome

use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for CRMDesk
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    // Outbound call metrics
    /// Outbound calls by outcome (success, http_error, transport_error)
    pub outbound_calls_total: CounterVec,
    /// Calls rejected because an identical call was in flight
    pub duplicate_calls_blocked_total: Counter,
    /// Calls currently in flight through the tracker
    pub active_outbound_calls: Gauge,
    /// Outbound call duration
    pub outbound_call_duration_seconds: Histogram,

    // Theme metrics
    /// Theme resolutions by outcome (verified, fallback)
    pub theme_resolutions_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let outbound_calls_total = CounterVec::new(
            Opts::new(
                "crmdesk_outbound_calls_total",
                "Total number of outbound calls that reached the backend",
            ),
            &["outcome"],
        )?;

        let duplicate_calls_blocked_total = Counter::with_opts(Opts::new(
            "crmdesk_duplicate_calls_blocked_total",
            "Outbound calls rejected because an identical call was in flight",
        ))?;

        let active_outbound_calls = Gauge::with_opts(Opts::new(
            "crmdesk_active_outbound_calls",
            "Outbound calls currently in flight",
        ))?;

        let duration_opts = HistogramOpts::new(
            "crmdesk_outbound_call_duration_seconds",
            "Outbound call duration in seconds",
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
        let outbound_call_duration_seconds = Histogram::with_opts(duration_opts)?;

        let theme_resolutions_total = CounterVec::new(
            Opts::new(
                "crmdesk_theme_resolutions_total",
                "Theme resolutions by outcome",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(outbound_calls_total.clone()))?;
        registry.register(Box::new(duplicate_calls_blocked_total.clone()))?;
        registry.register(Box::new(active_outbound_calls.clone()))?;
        registry.register(Box::new(outbound_call_duration_seconds.clone()))?;
        registry.register(Box::new(theme_resolutions_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            outbound_calls_total,
            duplicate_calls_blocked_total,
            active_outbound_calls,
            outbound_call_duration_seconds,
            theme_resolutions_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record an outbound call that reached the backend
    pub fn record_outbound_call(&self, outcome: CallOutcome, duration_secs: f64) {
        self.outbound_calls_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.outbound_call_duration_seconds.observe(duration_secs);
    }

    /// Record a call rejected as a duplicate
    pub fn record_duplicate_blocked(&self) {
        self.duplicate_calls_blocked_total.inc();
    }

    /// Set the in-flight call gauge
    pub fn set_active_calls(&self, count: usize) {
        self.active_outbound_calls.set(count as f64);
    }

    /// Record the outcome of a theme resolution
    pub fn record_theme_resolution(&self, verified: bool) {
        let outcome = if verified { "verified" } else { "fallback" };
        self.theme_resolutions_total
            .with_label_values(&[outcome])
            .inc();
    }
}

/// Outcome label for outbound calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// 2xx/3xx response
    Success,
    /// Backend answered with 4xx/5xx
    HttpError,
    /// No response (connect failure, timeout)
    TransportError,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::TransportError => "transport_error",
        }
    }

    /// Outcome for a response status code
    pub fn from_status(status: u16) -> Self {
        if status >= 400 {
            Self::HttpError
        } else {
            Self::Success
        }
    }
}
