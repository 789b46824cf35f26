//! Inbound payload decoding.
//!
//! The robot server's response shape is not contractually fixed, so the
//! client never rejects an inbound frame: [`decode`] classifies the payload
//! as JSON or preserves it verbatim, and [`ServerMessage`] offers a typed
//! view over the shapes the server is known to emit.
//!
//! # Known Server Messages
//!
//! | Wire `type` | Variant | Payload |
//! |-------------|---------|---------|
//! | `status` | [`ServerMessage::Status`] | `state`, optional `battery`, `message` |
//! | `aruco_found` | [`ServerMessage::ArucoFound`] | `marker_id`, `distance_cm`, `angle_deg` |
//! | `pour_complete` | [`ServerMessage::PourComplete`] | `ml_poured` |
//! | `error` | [`ServerMessage::Error`] | `code`, `message` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// DecodedMessage
// ============================================================================

/// Result of decoding an inbound text payload.
///
/// Total: unparseable input is preserved as [`DecodedMessage::Raw`] rather
/// than discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// The payload parsed as JSON.
    Structured(Value),
    /// The payload was not JSON; kept verbatim.
    Raw(String),
}

impl DecodedMessage {
    /// Returns the JSON value if the payload was structured.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Attempts a typed view of the payload as a known server message.
    #[must_use]
    pub fn as_server_message(&self) -> Option<ServerMessage> {
        match self {
            Self::Structured(value) => serde_json::from_value(value.clone()).ok(),
            Self::Raw(_) => None,
        }
    }
}

/// Decodes an inbound text payload.
///
/// Never fails: JSON payloads become [`DecodedMessage::Structured`], anything
/// else becomes [`DecodedMessage::Raw`].
#[must_use]
pub fn decode(text: &str) -> DecodedMessage {
    match serde_json::from_str(text) {
        Ok(value) => DecodedMessage::Structured(value),
        Err(_) => DecodedMessage::Raw(text.to_string()),
    }
}

// ============================================================================
// ServerMessage
// ============================================================================

/// A typed view of the robot server's known outbound messages.
///
/// Convenience only; the connection delivers payloads verbatim and callers
/// that want typing opt in via [`ServerMessage::parse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Periodic robot status report.
    Status {
        /// Current state machine state name.
        state: String,
        /// Battery percentage, if reported.
        #[serde(default)]
        battery: Option<i32>,
        /// Free-form status text, if any.
        #[serde(default)]
        message: Option<String>,
    },

    /// A previously requested ArUco marker was located.
    ArucoFound {
        /// Identifier of the located marker.
        marker_id: i32,
        /// Distance to the marker in centimetres.
        distance_cm: f64,
        /// Bearing to the marker in degrees.
        angle_deg: f64,
    },

    /// A pour command finished.
    PourComplete {
        /// Millilitres actually dispensed.
        ml_poured: f64,
    },

    /// The server rejected or failed to process a command.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerMessage {
    /// Parses a text payload into a typed server message.
    ///
    /// Returns `None` for non-JSON payloads and for JSON of unknown shape;
    /// neither is an error from the client's contract.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_object() {
        let decoded = decode(r#"{"type":"status","state":"idle"}"#);
        assert!(matches!(decoded, DecodedMessage::Structured(_)));
    }

    #[test]
    fn test_decode_raw_text() {
        let decoded = decode("not json");
        assert_eq!(decoded, DecodedMessage::Raw("not json".to_string()));
    }

    #[test]
    fn test_decode_never_discards() {
        let decoded = decode("{broken json");
        assert_eq!(decoded, DecodedMessage::Raw("{broken json".to_string()));
    }

    #[test]
    fn test_as_json() {
        let decoded = decode(r#"{"key":"value"}"#);
        let json = decoded.as_json().expect("structured");
        assert_eq!(json.get("key").and_then(Value::as_str), Some("value"));

        assert!(decode("plain").as_json().is_none());
    }

    #[test]
    fn test_parse_status() {
        let msg = ServerMessage::parse(r#"{"type":"status","state":"scanning","battery":87}"#)
            .expect("known shape");
        assert_eq!(
            msg,
            ServerMessage::Status {
                state: "scanning".to_string(),
                battery: Some(87),
                message: None,
            }
        );
    }

    #[test]
    fn test_parse_aruco_found() {
        let msg = ServerMessage::parse(
            r#"{"type":"aruco_found","marker_id":7,"distance_cm":42.5,"angle_deg":-13.0}"#,
        )
        .expect("known shape");
        assert_eq!(
            msg,
            ServerMessage::ArucoFound {
                marker_id: 7,
                distance_cm: 42.5,
                angle_deg: -13.0,
            }
        );
    }

    #[test]
    fn test_parse_pour_complete() {
        let msg = ServerMessage::parse(r#"{"type":"pour_complete","ml_poured":249.5}"#)
            .expect("known shape");
        assert_eq!(msg, ServerMessage::PourComplete { ml_poured: 249.5 });
    }

    #[test]
    fn test_parse_server_error() {
        let msg = ServerMessage::parse(r#"{"type":"error","code":"INVALID_JSON","message":"bad"}"#)
            .expect("known shape");
        assert!(matches!(msg, ServerMessage::Error { .. }));
    }

    #[test]
    fn test_parse_unknown_shape() {
        assert!(ServerMessage::parse(r#"{"type":"telemetry"}"#).is_none());
        assert!(ServerMessage::parse("ack").is_none());
    }

    #[test]
    fn test_as_server_message() {
        let decoded = decode(r#"{"type":"status","state":"idle"}"#);
        assert!(decoded.as_server_message().is_some());

        let decoded = decode("ack");
        assert!(decoded.as_server_message().is_none());
    }
}
