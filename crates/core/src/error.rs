//! Error types for ranobe operations.
//!
//! This module defines the main error type [`RanobeError`] which represents
//! every failure that can stop a title parse, a chapter amendment or a
//! collector run. Field-level problems (a missing data block, an unknown
//! status label) are never errors; they are reported as warnings through a
//! [`Reporter`](crate::Reporter) and the field is left unset.
//!
//! # Example
//!
//! ```rust
//! use ranobe_core::{RanobeError, Result};
//!
//! fn title_id(slug: &str) -> Result<u64> {
//!     slug.split('-')
//!         .next()
//!         .and_then(|prefix| prefix.parse().ok())
//!         .ok_or_else(|| RanobeError::InvalidSlug(slug.to_string()))
//! }
//! # assert_eq!(title_id("42-novel").unwrap(), 42);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scraping and conversion operations.
#[derive(Error, Debug)]
pub enum RanobeError {
    /// HTTP client errors from reqwest.
    ///
    /// Network errors, DNS failures and connection problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-success status.
    ///
    /// Transport failures on the title, listing, chapter and collector
    /// endpoints are hard stops for the current operation.
    #[error("Request to {url} failed with status {status}")]
    Request { status: u16, url: String },

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// JSON payload could not be decoded.
    #[error("Failed to decode JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An in-text anchor points at a footnote the chapter does not define.
    ///
    /// The index and the anchors are read from the same container, so this
    /// always indicates malformed markup and aborts the chapter.
    #[error("Footnote \"{id}\" is referenced but not defined in the chapter")]
    MissingFootnote { id: String },

    /// A structural part of a page or payload required to continue is absent.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// The slug does not start with a numeric title ID.
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Settings errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for RanobeError.
pub type Result<T> = std::result::Result<T, RanobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RanobeError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_request_error() {
        let err = RanobeError::Request { status: 404, url: "https://example.com/ranobe/1-a".to_string() };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("/ranobe/1-a"));
    }

    #[test]
    fn test_missing_footnote_error() {
        let err = RanobeError::MissingFootnote { id: "fn3".to_string() };
        assert!(err.to_string().contains("fn3"));
    }

    #[test]
    fn test_timeout_error() {
        let err = RanobeError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
