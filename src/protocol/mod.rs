//! Wire protocol message types.
//!
//! Pure functions and types mapping typed commands to their JSON wire form
//! and inbound text payloads back to something structured. No I/O, no state;
//! the [`transport`](crate::transport) layer owns the socket.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | [`Command`] | Client → Server | `{"type":"find_aruco","marker_id":7}` |
//! | inbound frame | Server → Client | unspecified; see [`decode`] |
//!
//! The server is not required to reciprocate JSON: [`decode`] preserves
//! non-JSON payloads verbatim as [`DecodedMessage::Raw`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound command definitions and encoding |
//! | `message` | Inbound payload decoding and typed server messages |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command definitions and encoding.
pub mod command;

/// Inbound payload decoding.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, parse_marker_id};
pub use message::{DecodedMessage, ServerMessage, decode};
