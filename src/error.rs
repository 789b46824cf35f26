//! Error types for the Versy remote-control client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use versy_client::{Connection, Command, Result};
//!
//! async fn example(conn: &Connection) -> Result<()> {
//!     conn.send(&Command::FindMarker { marker_id: 7 }).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Input | [`Error::InvalidEndpoint`], [`Error::InvalidCommand`] |
//! | Lifecycle | [`Error::InvalidState`], [`Error::FailedToConnect`], [`Error::ConnectionClosed`] |
//! | Transport | [`Error::SendFailed`], [`Error::WebSocket`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::ConnectionState;

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
/// Each variant includes relevant context for debugging. No variant is fatal
/// to the [`Connection`](crate::Connection): after any failure the manager
/// returns to `Disconnected` and can be reused.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Malformed `host:port` endpoint string.
    ///
    /// Surfaced before any network attempt is made.
    #[error("Invalid endpoint: {message}")]
    InvalidEndpoint {
        /// Description of what was malformed.
        message: String,
    },

    /// Invalid command input.
    ///
    /// Returned when user-supplied command data (e.g. a marker identifier
    /// typed as text) cannot be validated.
    #[error("Invalid command: {message}")]
    InvalidCommand {
        /// Description of the invalid input.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation attempted in a state that forbids it.
    ///
    /// Surfaced synchronously; no side effect occurs and no state changes.
    #[error("Invalid state: cannot {operation} while {state}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the connection was in.
        state: ConnectionState,
    },

    /// Handshake, DNS resolution, or connect timeout failure.
    ///
    /// Recoverable: the manager is back in `Disconnected` and `connect` may
    /// be called again.
    #[error("Failed to connect: {reason}")]
    FailedToConnect {
        /// Description of the connection failure.
        reason: String,
    },

    /// The connection or connect attempt was torn down underneath the
    /// operation (e.g. a concurrent `close` raced an in-flight `connect`).
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport write error.
    ///
    /// `send` surfaces this without transitioning state; the read loop's own
    /// failure detection is the authority on connection teardown.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Description of the write failure.
        message: String,
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

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            message: message.into(),
        }
    }

    /// Creates an invalid command error.
    #[inline]
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    #[must_use]
    pub fn invalid_state(operation: &'static str, state: ConnectionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates a failed-to-connect error.
    #[inline]
    pub fn failed_to_connect(reason: impl Into<String>) -> Self {
        Self::FailedToConnect {
            reason: reason.into(),
        }
    }

    /// Creates a send failed error.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from invalid caller input.
    #[inline]
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidEndpoint { .. } | Self::InvalidCommand { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::FailedToConnect { .. }
                | Self::ConnectionClosed
                | Self::SendFailed { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry once the connection is back
    /// in `Disconnected`.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToConnect { .. } | Self::SendFailed { .. } | Self::ConnectionClosed
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
        let err = Error::invalid_endpoint("missing port");
        assert_eq!(err.to_string(), "Invalid endpoint: missing port");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::invalid_state("send", ConnectionState::Disconnected);
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot send while disconnected"
        );
    }

    #[test]
    fn test_is_invalid_input() {
        let endpoint_err = Error::invalid_endpoint("test");
        let command_err = Error::invalid_command("test");
        let other_err = Error::ConnectionClosed;

        assert!(endpoint_err.is_invalid_input());
        assert!(command_err.is_invalid_input());
        assert!(!other_err.is_invalid_input());
    }

    #[test]
    fn test_is_connection_error() {
        let connect_err = Error::failed_to_connect("refused");
        let send_err = Error::send_failed("broken pipe");
        let closed_err = Error::ConnectionClosed;
        let input_err = Error::invalid_command("test");

        assert!(connect_err.is_connection_error());
        assert!(send_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!input_err.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        let connect_err = Error::failed_to_connect("timeout");
        let state_err = Error::invalid_state("connect", ConnectionState::Connected);

        assert!(connect_err.is_recoverable());
        assert!(!state_err.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
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
