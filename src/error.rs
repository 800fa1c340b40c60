//! Error types for electron-control.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use electron_control::{Result, WindowOptions};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     let window = session.create_window(&WindowOptions::new()).await?;
//!     window.load_url("https://example.com").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::HostNotFound`], [`Error::ProcessLaunchFailed`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::NotConnected`] |
//! | Protocol | [`Error::Decode`], [`Error::InvalidArgument`], [`Error::Protocol`] |
//! | Requests | [`Error::RequestTimeout`] |
//! | Resources | [`Error::WindowNotFound`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{RequestId, WindowId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when launcher configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Host binary not found at path.
    #[error("Host executable not found at: {path}")]
    HostNotFound {
        /// Path where the host executable was expected.
        path: PathBuf,
    },

    /// Failed to launch the host process.
    #[error("Failed to launch host process: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection timeout waiting for the host to connect back.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The transport died while a request was waiting for its response.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation attempted on a session whose transport is gone.
    #[error("Not connected to host process")]
    NotConnected,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// A wire unit could not be decoded.
    ///
    /// Never surfaced by dispatch, only by direct calls to the codec.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A synchronous-style request did not complete in time.
    #[error("{operation} request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Operation that timed out (`window_create`, `window_load_url`).
        operation: &'static str,
        /// The correlation ID of the request.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Window is closed or was never registered.
    #[error("Window not found: {window_id}")]
    WindowNotFound {
        /// The missing window ID.
        window_id: WindowId,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a host not found error.
    #[inline]
    pub fn host_not_found(path: impl Into<PathBuf>) -> Self {
        Self::HostNotFound { path: path.into() }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(operation: &'static str, request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            operation,
            request_id,
            timeout_ms,
        }
    }

    /// Creates a window not found error.
    #[inline]
    pub fn window_not_found(window_id: WindowId) -> Self {
        Self::WindowNotFound { window_id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::ConnectionClosed | Self::NotConnected
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing binary path");
        assert_eq!(err.to_string(), "Configuration error: missing binary path");
    }

    #[test]
    fn test_request_timeout_display() {
        let request_id = RequestId::generate();
        let err = Error::request_timeout("window_create", request_id, 5000);
        assert_eq!(
            err.to_string(),
            format!("window_create request {request_id} timed out after 5000ms")
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout("window_load_url", RequestId::generate(), 30_000);
        let other_err = Error::NotConnected;

        assert!(timeout_err.is_timeout());
        assert!(Error::connection_timeout(5000).is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::connection_timeout(1000).is_connection_error());
        assert!(!Error::window_not_found(WindowId::new(3)).is_connection_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
