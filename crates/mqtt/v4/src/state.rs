//! Connection state reported by the network loop.
//!
//! The kernel publishes these through a `watch` channel so that callers can
//! observe the connection without touching the event loop.

use std::fmt;

/// Current state of the MQTT connection.
///
/// The lifecycle is one-way: `Connecting` -> `Connected` -> `Disconnected`,
/// or `Connecting` -> `Disconnected` when the broker refuses the session or
/// is unreachable. There is no reconnection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// CONNECT sent (or about to be), waiting for CONNACK.
    Connecting,

    /// CONNACK with success code received.
    Connected,

    /// The network loop has stopped. The `String` carries the reason.
    Disconnected(String),
}

impl ConnectionState {
    /// Returns a short identifier for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected(_) => "Disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected(reason) => write!(f, "Disconnected ({reason})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        assert_eq!(ConnectionState::Connecting.as_str(), "Connecting");
        assert_eq!(ConnectionState::Connected.as_str(), "Connected");
        assert_eq!(
            ConnectionState::Disconnected("gone".into()).as_str(),
            "Disconnected"
        );
    }

    #[test]
    fn test_display_includes_reason() {
        let state = ConnectionState::Disconnected("Connection refused".into());
        assert_eq!(state.to_string(), "Disconnected (Connection refused)");
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
    }
}
