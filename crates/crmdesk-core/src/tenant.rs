//! Tenant identifiers and the tenant verification wire format

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Identifier of a tenant, taken from the leading label of the request host.
///
/// Tenants are customer organizations addressed by subdomain
/// (`acme.example.com` → `acme`). The identifier is what the verification
/// service expects in its `subDomainName` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant ID from a subdomain label
    ///
    /// The label must be a valid DNS label: 1-63 ASCII alphanumerics or
    /// hyphens, not starting or ending with a hyphen.
    pub fn from_subdomain(subdomain: &str) -> Result<Self> {
        if subdomain.is_empty() || subdomain.len() > 63 {
            return Err(Error::InvalidTenant(format!(
                "label length must be 1-63, got {}",
                subdomain.len()
            )));
        }

        if subdomain.starts_with('-') || subdomain.ends_with('-') {
            return Err(Error::InvalidTenant(format!(
                "label cannot start or end with '-': {}",
                subdomain
            )));
        }

        if !subdomain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(Error::InvalidTenant(format!(
                "label contains invalid characters: {}",
                subdomain
            )));
        }

        Ok(Self(subdomain.to_string()))
    }

    /// Get the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_subdomain(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Response body of the tenant verification endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_success: bool,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub data: Option<TenantData>,
}

impl VerificationResult {
    /// Structured failure result used in place of an error
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Brand settings of a successful verification, if the tenant has any
    pub fn brand_settings(&self) -> Option<&BrandSettings> {
        if !self.is_success {
            return None;
        }

        self.data
            .as_ref()
            .and_then(|d| d.white_label_data.as_ref())
            .and_then(|w| w.brand_settings.as_ref())
    }
}

/// Tenant payload returned on successful verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_label_data: Option<WhiteLabelData>,
}

/// White-label configuration of a tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteLabelData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_settings: Option<BrandSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_banner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Brand colors of a tenant, each a `#rrggbb` hex string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_bg_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_text_color: Option<String>,
}
