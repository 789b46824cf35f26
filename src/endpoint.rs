//! Server endpoint parsing and validation.
//!
//! An [`Endpoint`] is the semantic `(host, port)` pair behind the single
//! `host:port` string the caller supplies. Validation happens here, before
//! any network attempt:
//!
//! - host must be non-empty
//! - port must be in `[1, 65535]`
//! - the resulting `ws://host:port/ws` URL must parse back to the same
//!   host and port (no path, userinfo or query smuggled into the host)
//!
//! # Example
//!
//! ```
//! use versy_client::Endpoint;
//!
//! let endpoint: Endpoint = "10.0.0.5:9000".parse().expect("valid endpoint");
//! assert_eq!(endpoint.host(), "10.0.0.5");
//! assert_eq!(endpoint.port(), 9000);
//! assert_eq!(endpoint.ws_url(), "ws://10.0.0.5:9000/ws");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::Error;

// ============================================================================
// Constants
// ============================================================================

/// WebSocket path exposed by the robot server.
const WS_PATH: &str = "/ws";

// ============================================================================
// Endpoint
// ============================================================================

/// A validated `host:port` pair identifying the robot server.
///
/// Construct via [`FromStr`]; an `Endpoint` that exists is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP address.
    host: String,
    /// TCP port, never zero.
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from separate host and port values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the host is empty, the port is
    /// zero, or the pair does not form a valid WebSocket URL.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, Error> {
        let host = host.into();

        if host.is_empty() {
            return Err(Error::invalid_endpoint("host must not be empty"));
        }
        if port == 0 {
            return Err(Error::invalid_endpoint("port must be in range 1-65535"));
        }

        let endpoint = Self { host, port };

        // The URL must round-trip to exactly this host and port. A host with
        // URL-meaningful characters ('/', '@', '?') would otherwise still
        // parse, but with part of it reinterpreted as path or userinfo, and
        // connect would dial a different authority than the caller named.
        let url = Url::parse(&endpoint.ws_url()).map_err(|_| {
            Error::invalid_endpoint(format!(
                "'{endpoint}' does not form a valid WebSocket URL"
            ))
        })?;
        let host_matches = url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(&endpoint.host));
        if !host_matches || url.port_or_known_default() != Some(port) {
            return Err(Error::invalid_endpoint(format!(
                "'{}' is not a plain host name or IP address",
                endpoint.host
            )));
        }

        Ok(endpoint)
    }

    /// Returns the host name or IP address.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the TCP port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this endpoint.
    ///
    /// Format: `ws://{host}:{port}/ws`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, WS_PATH)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Parses a `host:port` string.
    ///
    /// The split is on the last `:` so that the error for a missing port is
    /// reported even when the host itself contains colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let Some((host, port)) = s.rsplit_once(':') else {
            return Err(Error::invalid_endpoint(format!(
                "'{s}' is not in host:port form"
            )));
        };

        let port: u16 = port
            .parse()
            .map_err(|_| Error::invalid_endpoint(format!("'{port}' is not a valid port")))?;

        Self::new(host, port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let endpoint: Endpoint = "10.0.0.5:9000".parse().expect("valid");
        assert_eq!(endpoint.host(), "10.0.0.5");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn test_parse_hostname() {
        let endpoint: Endpoint = "raspberrypi.local:8000".parse().expect("valid");
        assert_eq!(endpoint.host(), "raspberrypi.local");
        assert_eq!(endpoint.port(), 8000);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let endpoint: Endpoint = "  192.168.1.10:8000  ".parse().expect("valid");
        assert_eq!(endpoint.host(), "192.168.1.10");
    }

    #[test]
    fn test_ws_url_format() {
        let endpoint: Endpoint = "192.168.1.10:8000".parse().expect("valid");
        assert_eq!(endpoint.ws_url(), "ws://192.168.1.10:8000/ws");
    }

    #[test]
    fn test_reject_missing_port() {
        let result: Result<Endpoint, _> = "10.0.0.5".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_empty_host() {
        let result: Result<Endpoint, _> = ":8000".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_zero_port() {
        let result: Result<Endpoint, _> = "10.0.0.5:0".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_non_numeric_port() {
        let result: Result<Endpoint, _> = "10.0.0.5:http".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_out_of_range_port() {
        let result: Result<Endpoint, _> = "10.0.0.5:70000".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_host_with_spaces() {
        let result: Result<Endpoint, _> = "not a host:8000".parse();
        assert!(matches!(result, Err(Error::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_reject_host_with_url_characters() {
        // These all form *valid* URLs, just not with the named host: the
        // slash starts a path, the '@' turns the prefix into userinfo, the
        // '?' starts a query. Each must be caught before connect.
        for input in ["a/b:8000", "user@host:8000", "host?x=1:8000", "host#f:8000"] {
            let result: Result<Endpoint, _> = input.parse();
            assert!(
                matches!(result, Err(Error::InvalidEndpoint { .. })),
                "'{input}' must be rejected"
            );
        }
    }

    #[test]
    fn test_parse_default_port() {
        // Port 80 is the ws:// default and elided by URL normalization; it
        // must still round-trip.
        let endpoint: Endpoint = "10.0.0.5:80".parse().expect("valid");
        assert_eq!(endpoint.port(), 80);
    }

    #[test]
    fn test_ws_url_host_round_trips() {
        let endpoint: Endpoint = "raspberrypi.local:8000".parse().expect("valid");
        let url = Url::parse(&endpoint.ws_url()).expect("valid url");
        assert_eq!(url.host_str(), Some(endpoint.host()));
        assert_eq!(url.port_or_known_default(), Some(endpoint.port()));
    }

    #[test]
    fn test_display_roundtrip() {
        let endpoint: Endpoint = "10.0.0.5:9000".parse().expect("valid");
        let reparsed: Endpoint = endpoint.to_string().parse().expect("valid");
        assert_eq!(endpoint, reparsed);
    }
}
