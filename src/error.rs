//! Error types for the layout library.
//!
//! Layout analysis itself never fails: page-level errors are turned into
//! degraded pages and diagnostics by the aggregator. These errors surface
//! from ingestion, configuration, and serialization helpers.

use crate::fragment::PageId;

/// Result type alias for layout library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur around layout reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Page holds more fragments than the configured limit
    #[error("Page {page} has {count} fragments (limit: {limit})")]
    PageTooLarge {
        /// Offending page
        page: PageId,
        /// Number of usable fragments on the page
        count: usize,
        /// Configured limit
        limit: usize,
    },

    /// An internal invariant was broken (programming defect)
    #[error("Layout invariant violated: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_error() {
        let err = Error::InvalidConfig("max_columns must be positive".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("max_columns"));
    }

    #[test]
    fn test_page_too_large_error() {
        let err = Error::PageTooLarge {
            page: 3,
            count: 5000,
            limit: 1000,
        };
        assert_eq!(err.to_string(), "Page 3 has 5000 fragments (limit: 1000)");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
