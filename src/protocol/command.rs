//! Outbound command definitions and encoding.
//!
//! Commands are JSON objects tagged by a `type` field, matching what the
//! robot server's message router dispatches on.
//!
//! # Wire Format
//!
//! | Variant | Wire `type` | Payload |
//! |---------|-------------|---------|
//! | [`Command::FindMarker`] | `find_aruco` | `marker_id: int` |
//! | [`Command::Move`] | `move` | `x: float, y: float` |
//! | [`Command::Stop`] | `stop` | none |
//! | [`Command::Pour`] | `pour` | `ml: int` |
//!
//! Encoding is deterministic: the tag key is emitted first and field order
//! is fixed, so `encode` output is byte-stable for a given command.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Command
// ============================================================================

/// A command sent from the client to the robot server.
///
/// One JSON object per command, tagged by `type`. New commands are added as
/// variants here without touching the connection state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Ask the vision system to locate an ArUco marker.
    #[serde(rename = "find_aruco")]
    FindMarker {
        /// Integer identifier of the marker to locate.
        marker_id: i32,
    },

    /// Drive toward a target position.
    Move {
        /// Target X coordinate.
        x: f64,
        /// Target Y coordinate.
        y: f64,
    },

    /// Halt all movement.
    Stop,

    /// Dispense the given volume.
    Pour {
        /// Millilitres to pour.
        ml: u32,
    },
}

impl Command {
    /// Encodes this command as a JSON text frame.
    ///
    /// Output is valid JSON with a fixed key order, e.g.
    /// `{"type":"find_aruco","marker_id":7}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails (does not happen for
    /// the variants defined here).
    #[inline]
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Input Parsing
// ============================================================================

/// Parses a marker identifier from free-form user input.
///
/// The remote-control UI collects the marker ID as text; this validates it
/// before a [`Command::FindMarker`] is built.
///
/// # Errors
///
/// Returns [`Error::InvalidCommand`] on empty or non-integer input.
pub fn parse_marker_id(input: &str) -> Result<i32> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::invalid_command("marker ID must not be empty"));
    }

    input
        .parse()
        .map_err(|_| Error::invalid_command(format!("'{input}' is not an integer marker ID")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_find_marker_exact() {
        let cmd = Command::FindMarker { marker_id: 7 };
        let json = cmd.encode().expect("encode");
        assert_eq!(json, r#"{"type":"find_aruco","marker_id":7}"#);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let cmd = Command::FindMarker { marker_id: 42 };
        let first = cmd.encode().expect("encode");
        let second = cmd.encode().expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_negative_marker_id() {
        let cmd = Command::FindMarker { marker_id: -1 };
        let json = cmd.encode().expect("encode");
        assert_eq!(json, r#"{"type":"find_aruco","marker_id":-1}"#);
    }

    #[test]
    fn test_encode_move() {
        let cmd = Command::Move { x: 1.5, y: -0.5 };
        let json = cmd.encode().expect("encode");
        assert_eq!(json, r#"{"type":"move","x":1.5,"y":-0.5}"#);
    }

    #[test]
    fn test_encode_stop() {
        let cmd = Command::Stop;
        let json = cmd.encode().expect("encode");
        assert_eq!(json, r#"{"type":"stop"}"#);
    }

    #[test]
    fn test_encode_pour() {
        let cmd = Command::Pour { ml: 250 };
        let json = cmd.encode().expect("encode");
        assert_eq!(json, r#"{"type":"pour","ml":250}"#);
    }

    #[test]
    fn test_command_roundtrip() {
        let cmd = Command::FindMarker { marker_id: 3 };
        let json = cmd.encode().expect("encode");
        let parsed: Command = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_parse_marker_id_valid() {
        assert_eq!(parse_marker_id("7").expect("valid"), 7);
        assert_eq!(parse_marker_id("  42  ").expect("valid"), 42);
        assert_eq!(parse_marker_id("-3").expect("valid"), -3);
    }

    #[test]
    fn test_parse_marker_id_empty() {
        let result = parse_marker_id("   ");
        assert!(matches!(result, Err(Error::InvalidCommand { .. })));
    }

    #[test]
    fn test_parse_marker_id_non_integer() {
        let result = parse_marker_id("seven");
        assert!(matches!(result, Err(Error::InvalidCommand { .. })));

        let result = parse_marker_id("3.5");
        assert!(matches!(result, Err(Error::InvalidCommand { .. })));
    }
}
