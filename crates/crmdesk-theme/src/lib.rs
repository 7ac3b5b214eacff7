//! CRMDesk Theme Resolution
//!
//! Derives a tenant's CSS custom properties during server-side rendering:
//! - `host`: tenant identifier from the request `Host` header
//! - `verify`: tenant verification against the remote white-label service
//! - `palette`: brand colors to a complete CSS variable block
//! - `resolver`: the per-render pipeline tying the three together
//!
//! Every failure along the way degrades to the built-in default palette;
//! nothing here can prevent a page from rendering.

pub mod host;
pub mod palette;
pub mod resolver;
pub mod verify;

pub use host::{DEFAULT_TENANT, resolve_tenant, resolve_tenant_with_default};
pub use palette::{DerivedPalette, Rgb, adjust_brightness, derive_palette};
pub use resolver::{ResolvedTheme, ThemeResolver, ThemeResolverConfig};
pub use verify::TenantVerifier;

use thiserror::Error;

/// Reasons a tenant verification did not produce a result
///
/// These never escape the crate as errors; their messages become the
/// `message` of a failed verification result.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Verification request failed: {0}")]
    Transport(#[from] crmdesk_egress::EgressError),

    #[error("Verification failed with status {0}")]
    Status(u16),

    #[error("Malformed verification response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid verification query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}
