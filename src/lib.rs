//! Versy client - WebSocket remote control for the Versy robot server.
//!
//! This library maintains a persistent bidirectional WebSocket connection to
//! a robot/vision server and exchanges small JSON-encoded command/response
//! messages.
//!
//! # Architecture
//!
//! Two components, leaves first:
//!
//! - **[`protocol`]**: pure codec mapping typed [`Command`]s to their JSON
//!   wire form and inbound text payloads to [`DecodedMessage`]s. No I/O,
//!   no state.
//! - **[`transport`]**: the [`Connection`] manager owning the socket
//!   lifecycle (connect, send, receive-dispatch, close) and the observable
//!   [`ConnectionState`]. All lifecycle and message notifications arrive on
//!   one ordered [`ConnectionEvent`] channel, so a UI or any other consumer
//!   subscribes in exactly one place.
//!
//! # Quick Start
//!
//! ```no_run
//! use versy_client::{Command, Connection, ConnectionEvent, Endpoint, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let endpoint: Endpoint = "192.168.1.10:8000".parse()?;
//!     let (conn, mut events) = Connection::new();
//!
//!     conn.connect(&endpoint).await?;
//!     conn.send(&Command::FindMarker { marker_id: 7 }).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             ConnectionEvent::Opened => println!("connected"),
//!             ConnectionEvent::Message(msg) => println!("[{}] {}", msg.seq, msg.payload),
//!             ConnectionEvent::Closed { code, reason } => {
//!                 println!("closed ({code}): {reason}");
//!                 break;
//!             }
//!             ConnectionEvent::FailedToConnect { reason } => {
//!                 println!("failed: {reason}");
//!                 break;
//!             }
//!         }
//!     }
//!
//!     conn.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`endpoint`] | `host:port` parsing and validation |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Command encoding and payload decoding (internal codec) |
//! | [`transport`] | Connection manager and lifecycle state machine |

// ============================================================================
// Modules
// ============================================================================

/// Server endpoint parsing and validation.
///
/// An [`Endpoint`] is validated before any network attempt is made.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire protocol message types.
///
/// Pure codec: typed commands out, opaque-or-structured payloads in.
pub mod protocol;

/// WebSocket transport layer.
///
/// Connection manager, lifecycle state machine, and event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Endpoint types
pub use endpoint::Endpoint;

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Command, DecodedMessage, ServerMessage, decode, parse_marker_id};

// Transport types
pub use transport::{Connection, ConnectionEvent, ConnectionState, EventReceiver, InboundMessage};
