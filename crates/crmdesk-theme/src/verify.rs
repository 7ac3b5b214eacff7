//! Tenant verification against the white-label service

use crate::VerifyError;
use crmdesk_core::VerificationResult;
use crmdesk_egress::{OutboundRequest, Transport};
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for the remote tenant verification endpoint
///
/// Issues `GET <endpoint>?deviceType=..&subDomainName=..` and never returns
/// an error: every failure becomes a result with `is_success == false`.
#[derive(Clone)]
pub struct TenantVerifier {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl TenantVerifier {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Full verification URL for a tenant
    pub fn verification_url(&self, tenant: &str, device: &str) -> Result<String, VerifyError> {
        let params = [("deviceType", device), ("subDomainName", tenant)];
        let query = serde_urlencoded::to_string(params)?;
        let has_query = self.endpoint.contains('?');
        let separator = if has_query { '&' } else { '?' };

        Ok(format!("{}{}{}", self.endpoint, separator, query))
    }

    /// Verify a tenant; failures are folded into the result
    pub async fn verify_tenant(&self, tenant: &str, device_type: &str) -> VerificationResult {
        match self.try_verify(tenant, device_type).await {
            Ok(result) => {
                debug!(
                    tenant,
                    is_success = result.is_success,
                    message = %result.message,
                    "Tenant verification completed"
                );
                result
            }
            Err(e) => {
                warn!(tenant, error = %e, "Tenant verification failed");
                VerificationResult::failure(e.to_string())
            }
        }
    }

    async fn try_verify(
        &self,
        tenant: &str,
        device_type: &str,
    ) -> Result<VerificationResult, VerifyError> {
        let url = self.verification_url(tenant, device_type)?;
        let response = self.transport.execute(OutboundRequest::get(url)).await?;

        if !response.is_success() {
            return Err(VerifyError::Status(response.status.as_u16()));
        }

        Ok(response.json()?)
    }
}
