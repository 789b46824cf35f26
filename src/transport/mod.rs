//! WebSocket transport layer.
//!
//! This module owns the connection lifecycle between the client and the
//! robot server.
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)   │                              │  Robot Server   │
//! │                  │          WebSocket           │                 │
//! │  Connection      │◄────────────────────────────►│  ws://host:port │
//! │  → event loop    │        one JSON object       │      /ws        │
//! │                  │        per text frame        │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::new` - Create the manager and the caller's event channel
//! 2. `Connection::connect` - Dial `ws://{endpoint}/ws`, handshake
//! 3. `Connection::send` - Write encoded command frames
//! 4. `Connection::close` - Graceful close with code 1000
//!
//! Lifecycle notifications (`Opened`, `Message`, `Closed`, `FailedToConnect`)
//! arrive on the single event channel in transport order.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection manager and socket event loop |
//! | `state` | Lifecycle state enum |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection manager and event loop.
pub mod connection;

/// Connection lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionEvent, EventReceiver, InboundMessage};
pub use state::ConnectionState;
