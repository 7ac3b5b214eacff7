//! CRMDesk server
//!
//! Serves the tenant-themed page shell and forwards `/api/*` calls to the
//! CRM backend through the duplicate-call tracker.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;

pub use app::{AppState, build_router};
pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
