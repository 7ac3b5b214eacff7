//! Error types for CRMDesk Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidTenant("bad label".to_string());
        assert_eq!(err.to_string(), "Invalid tenant: bad label");

        let err = Error::InvalidColor("#12".to_string());
        assert_eq!(err.to_string(), "Invalid color: #12");
    }
}
