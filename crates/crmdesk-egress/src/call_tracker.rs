//! Duplicate in-flight call tracking
//!
//! The tracker fingerprints every outbound request as
//! `method:url:body_digest` and refuses to start a request whose fingerprint
//! is already in flight. Duplicates fail fast with
//! [`EgressError::DuplicateCall`]; they are never coalesced onto the first
//! call's response.
//!
//! Fingerprints are taken from the raw URL string. Two requests that differ
//! only in query parameter order are distinct calls.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use crmdesk_egress::{CallTracker, HttpClientConfig, HttpTransport};
//! # use crmdesk_egress::{OutboundRequest, Transport};
//! # async fn example() -> crmdesk_egress::Result<()> {
//! let tracker = Arc::new(CallTracker::new());
//! let http = HttpTransport::new(&HttpClientConfig::default())?;
//! let transport = tracker.install(Arc::new(http));
//!
//! let _response = transport
//!     .execute(OutboundRequest::get("https://api.example.com/leads"))
//!     .await?;
//! assert_eq!(tracker.active_calls_count(), 0);
//! # Ok(())
//! # }
//! ```

use crate::{EgressError, OutboundRequest, RequestBody, Result, Transport, TransportResponse};
use async_trait::async_trait;
use dashmap::DashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Maximum number of body characters kept in a fingerprint
pub const BODY_DIGEST_LIMIT: usize = 100;

/// Digest used for bodies that are not text
pub const OBJECT_BODY_TAG: &str = "[object]";

const TRACKED_TRANSPORT_NAME: &str = "tracked";

/// Key identifying a request for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallFingerprint {
    method: String,
    url: String,
    body_digest: String,
}

impl CallFingerprint {
    pub fn from_request(request: &OutboundRequest) -> Self {
        Self {
            method: request.effective_method().as_str().to_string(),
            url: request.url.clone(),
            body_digest: digest_body(request.body.as_ref()),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body_digest(&self) -> &str {
        &self.body_digest
    }

    /// Composite `method:url:body_digest` key
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.method, self.url, self.body_digest)
    }
}

impl fmt::Display for CallFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.method, self.url, self.body_digest)
    }
}

fn digest_body(body: Option<&RequestBody>) -> String {
    match body {
        None => String::new(),
        Some(RequestBody::Text(text)) => match text.char_indices().nth(BODY_DIGEST_LIMIT) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.clone(),
        },
        Some(RequestBody::Json(_)) | Some(RequestBody::Bytes(_)) => OBJECT_BODY_TAG.to_string(),
    }
}

/// Tracks outbound calls currently in flight
///
/// One tracker is shared (via `Arc`) by everything that issues backend calls.
/// Tests construct their own isolated instances.
#[derive(Debug, Default)]
pub struct CallTracker {
    active: DashSet<String>,
}

/// Releases a fingerprint when the call settles or its future is dropped
struct ActiveCallGuard<'a> {
    active: &'a DashSet<String>,
    key: String,
}

impl Drop for ActiveCallGuard<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a transport so every call through it is tracked
    ///
    /// Installing onto a transport that is already tracked returns it
    /// unchanged, so the tracking layer is applied at most once.
    pub fn install(self: &Arc<Self>, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        if transport.name() == TRACKED_TRANSPORT_NAME {
            debug!("Call tracker already installed, skipping");
            return transport;
        }

        info!(transport = transport.name(), "Call tracker installed");
        Arc::new(TrackedTransport {
            inner: transport,
            tracker: Arc::clone(self),
        })
    }

    /// Run one request through `transport` unless an identical one is in flight
    pub async fn intercept(
        &self,
        transport: &dyn Transport,
        request: OutboundRequest,
    ) -> Result<TransportResponse> {
        let fingerprint = CallFingerprint::from_request(&request);
        let key = fingerprint.key();

        // Check and insert happen in one step; DashSet::insert reports
        // whether the key was absent.
        if !self.active.insert(key.clone()) {
            warn!(
                method = fingerprint.method(),
                url = fingerprint.url(),
                "Duplicate call blocked"
            );
            return Err(EgressError::DuplicateCall { fingerprint: key });
        }

        let guard = ActiveCallGuard {
            active: &self.active,
            key,
        };

        debug!(
            method = fingerprint.method(),
            url = fingerprint.url(),
            active_calls = self.active.len(),
            "Tracked call started"
        );

        let started = Instant::now();
        let result = transport.execute(request).await;
        drop(guard);

        match &result {
            Ok(response) => debug!(
                method = fingerprint.method(),
                url = fingerprint.url(),
                status = response.status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Tracked call succeeded"
            ),
            Err(e) => warn!(
                method = fingerprint.method(),
                url = fingerprint.url(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Tracked call failed"
            ),
        }

        result
    }

    /// Forget every in-flight fingerprint
    ///
    /// Underlying calls keep running; only the bookkeeping is reset.
    /// Returns how many entries were dropped.
    pub fn clear_active_calls(&self) -> usize {
        let cleared = self.active.len();
        self.active.clear();
        info!(cleared, "Active call set cleared");
        cleared
    }

    pub fn active_calls_count(&self) -> usize {
        self.active.len()
    }
}

/// Transport decorator that routes every call through a [`CallTracker`]
pub struct TrackedTransport {
    inner: Arc<dyn Transport>,
    tracker: Arc<CallTracker>,
}

#[async_trait]
impl Transport for TrackedTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse> {
        self.tracker.intercept(self.inner.as_ref(), request).await
    }

    fn name(&self) -> &'static str {
        TRACKED_TRANSPORT_NAME
    }
}

/// Issue a single tracked call without installing a decorator
pub async fn tracked_fetch(
    tracker: &CallTracker,
    transport: &dyn Transport,
    request: OutboundRequest,
) -> Result<TransportResponse> {
    tracker.intercept(transport, request).await
}
