//! CRMDesk Core Types
//!
//! This crate provides the fundamental types shared across CRMDesk:
//! - Tenant identifiers and the tenant verification wire format
//! - Brand settings supplied by the verification service
//! - Core error types

pub mod error;
pub mod tenant;

pub use error::{Error, Result};
pub use tenant::{BrandSettings, TenantData, TenantId, VerificationResult, WhiteLabelData};
