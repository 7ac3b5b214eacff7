//! CRMDesk Egress
//!
//! This crate owns every outbound call to the CRM backend:
//! - Shared HTTP client construction
//! - The `Transport` abstraction and its reqwest implementation
//! - The call tracker that blocks duplicate in-flight requests

pub mod call_tracker;
pub mod client;
pub mod transport;

pub use call_tracker::{CallFingerprint, CallTracker, TrackedTransport, tracked_fetch};
pub use client::{HttpClientConfig, create_client};
pub use transport::{HttpTransport, OutboundRequest, RequestBody, Transport, TransportResponse};

use thiserror::Error;

/// Egress error types
#[derive(Debug, Error)]
pub enum EgressError {
    /// An identical request is already in flight
    #[error("Duplicate call blocked: {fingerprint}")]
    DuplicateCall { fingerprint: String },

    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client construction failed
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl EgressError {
    /// Whether this is the synthetic duplicate-call rejection
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EgressError::DuplicateCall { .. })
    }
}

pub type Result<T> = std::result::Result<T, EgressError>;
