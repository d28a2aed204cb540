//! Error types for the transfer module.
//!
//! Structured errors for every failure class a transfer can hit, with the
//! context (URL, path, status) callers need to render targeted guidance.
//! Presentation of these reasons is the controller layer's job; the engine
//! only classifies.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while probing or streaming a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The provided URL is malformed or does not use an http/https scheme.
    ///
    /// Rejected synchronously on submit, before any network I/O.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors,
    /// mid-stream disconnects).
    #[error("network error transferring {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout transferring {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    ///
    /// The status code is surfaced verbatim so callers can map 403/404 to
    /// user-facing guidance.
    #[error("HTTP {status} transferring {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (create, open, write, flush on the destination).
    #[error("filesystem error writing to {path}: {source}")]
    Filesystem {
        /// The destination path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Final file size does not match the server-reported total.
    #[error(
        "integrity check failed for {path}: expected {expected_bytes} bytes, got {actual_bytes}"
    )]
    Integrity {
        /// Destination path that failed verification.
        path: PathBuf,
        /// Expected size in bytes.
        expected_bytes: u64,
        /// Actual size in bytes.
        actual_bytes: u64,
    },

    /// A transfer is already running on this engine instance.
    ///
    /// Rejected synchronously; the running transfer is unaffected.
    #[error("a transfer is already active on this engine instance")]
    AlreadyActive,
}

impl TransferError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates an integrity mismatch error.
    pub fn integrity(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Integrity {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because the variants require context (url, path)
// that the source errors don't carry. The helper constructors are the
// pattern here: callers supply the context at the failure site.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display() {
        let error = TransferError::invalid_url("ftp://example.com/file");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected prefix in: {msg}");
        assert!(msg.contains("ftp://example.com/file"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_http_status_display() {
        let error = TransferError::http_status("https://example.com/file.iso", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.iso"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_filesystem_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = TransferError::filesystem(PathBuf::from("/tmp/out.bin"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/out.bin"), "Expected path in: {msg}");
    }

    #[test]
    fn test_integrity_display() {
        let error = TransferError::integrity(PathBuf::from("/tmp/out.bin"), 1000, 900);
        let msg = error.to_string();
        assert!(msg.contains("1000"), "Expected expected size in: {msg}");
        assert!(msg.contains("900"), "Expected actual size in: {msg}");
    }

    #[test]
    fn test_already_active_display() {
        let msg = TransferError::AlreadyActive.to_string();
        assert!(msg.contains("already active"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_timeout_display() {
        let error = TransferError::Timeout {
            url: "https://example.com/slow".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "Expected 'timeout' in: {msg}");
    }
}
