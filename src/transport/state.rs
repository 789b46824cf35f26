//! Connection lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Connection`](crate::Connection).
///
/// Exactly one state exists per connection manager, and every transition is
/// serialized through the manager's internal lock:
///
/// ```text
/// Disconnected --connect()--> Connecting
/// Connecting   --handshake OK--> Connected
/// Connecting   --handshake fail/timeout--> Disconnected
/// Connecting   --close()--> Disconnected (attempt aborted)
/// Connected    --close()--> Closing
/// Connected    --peer close / transport drop--> Disconnected
/// Closing      --teardown complete--> Disconnected
/// ```
///
/// A caller-initiated close passes through `Closing` because graceful close
/// is a negotiated two-step action; a dropped socket is discovered, not
/// negotiated, so it jumps straight to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No socket, no attempt in flight. The only state `connect` accepts.
    #[default]
    Disconnected,
    /// A handshake attempt is in flight.
    Connecting,
    /// The socket is established; `send` and `close` are legal.
    Connected,
    /// A caller-initiated graceful close is in progress.
    Closing,
}

impl ConnectionState {
    /// Returns `true` if a connection attempt or established connection
    /// currently exists.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// Returns `true` if the socket is established and usable for `send`.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_is_active() {
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Connected.is_active());
        assert!(ConnectionState::Closing.is_active());
    }

    #[test]
    fn test_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Closing.is_connected());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
    }
}
