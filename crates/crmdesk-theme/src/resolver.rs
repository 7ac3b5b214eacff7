//! Per-render theme resolution
//!
//! host → tenant → verification → palette. Each render resolves its theme
//! independently and always ends with a usable palette.

use crate::{
    DEFAULT_TENANT, DerivedPalette, TenantVerifier, derive_palette, resolve_tenant_with_default,
};
use crmdesk_core::{TenantId, VerificationResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Theme resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeResolverConfig {
    /// Device type reported to the verification service
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Tenant used when the host carries none
    #[serde(default = "default_tenant")]
    pub default_tenant: String,
}

fn default_device_type() -> String {
    "web".to_string()
}

fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

impl Default for ThemeResolverConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            default_tenant: default_tenant(),
        }
    }
}

/// Outcome of resolving the theme for one render
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTheme {
    pub tenant: String,
    /// Whether the verification service accepted the tenant
    pub verified: bool,
    pub message: String,
    pub palette: DerivedPalette,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResolvedTheme {
    /// Theme built without consulting the verification service
    pub fn fallback(tenant: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_verification(tenant.into(), VerificationResult::failure(message))
    }

    fn from_verification(tenant: String, result: VerificationResult) -> Self {
        let palette = derive_palette(result.brand_settings());
        let data = result.data.filter(|_| result.is_success);
        let white_label = data.as_ref().and_then(|d| d.white_label_data.clone());

        Self {
            tenant,
            verified: result.is_success,
            message: result.message,
            palette,
            logo_url: data.and_then(|d| d.logo_url),
            top_banner: white_label.as_ref().and_then(|w| w.top_banner.clone()),
            description: white_label.and_then(|w| w.description),
        }
    }

    /// `:root { ... }` block for the document head
    pub fn css(&self) -> String {
        self.palette.to_css()
    }
}

/// Resolves tenant themes for page renders
#[derive(Clone)]
pub struct ThemeResolver {
    verifier: TenantVerifier,
    config: ThemeResolverConfig,
}

impl ThemeResolver {
    pub fn new(verifier: TenantVerifier, config: ThemeResolverConfig) -> Self {
        Self { verifier, config }
    }

    /// Tenant for a host, using the configured default
    pub fn tenant_for_host(&self, host: &str) -> String {
        resolve_tenant_with_default(host, &self.config.default_tenant)
    }

    /// Resolve the theme for a request `Host` header (absent → empty)
    pub async fn resolve(&self, host: Option<&str>) -> ResolvedTheme {
        let host = host.unwrap_or("");
        let tenant = self.tenant_for_host(host);

        let result = match TenantId::from_subdomain(&tenant) {
            Ok(tenant_id) => {
                self.verifier
                    .verify_tenant(tenant_id.as_str(), &self.config.device_type)
                    .await
            }
            Err(e) => {
                warn!(
                    host,
                    tenant = %tenant,
                    error = %e,
                    "Skipping verification for invalid tenant"
                );
                VerificationResult::failure(e.to_string())
            }
        };

        let theme = ResolvedTheme::from_verification(tenant, result);

        if theme.verified {
            info!(
                tenant = %theme.tenant,
                primary = theme.palette.primary(),
                "Tenant theme resolved"
            );
        } else {
            debug!(tenant = %theme.tenant, reason = %theme.message, "Using default theme");
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::DEFAULT_PRIMARY;

    #[test]
    fn test_default_config() {
        let config = ThemeResolverConfig::default();
        assert_eq!(config.device_type, "web");
        assert_eq!(config.default_tenant, "app");
    }

    #[test]
    fn test_fallback_theme() {
        let theme = ResolvedTheme::fallback("acme", "offline");

        assert_eq!(theme.tenant, "acme");
        assert!(!theme.verified);
        assert_eq!(theme.message, "offline");
        assert_eq!(theme.palette.primary(), DEFAULT_PRIMARY);
        assert!(theme.logo_url.is_none());
        assert_eq!(theme.css(), derive_palette(None).to_css());
    }
}
