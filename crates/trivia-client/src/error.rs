//! Unified error type for the trivia client.

use trivia_protocol::{ErrorKind, ProtocolError};
use trivia_session::SessionError;
use trivia_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, validation).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (handshake, lock-step, dead connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Names the error category, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TransportError",
            Self::Protocol(e) => protocol_kind(e),
            Self::Session(e) => match e {
                SessionError::Handshake(_) => "HandshakeError",
                SessionError::Transport(_) => "TransportError",
                SessionError::Framing(e)
                | SessionError::Payload(e)
                | SessionError::Command(e) => protocol_kind(e),
                SessionError::ServerRejected(_) => "ServerNotice",
                SessionError::Timeout(_) => "TimeoutError",
                SessionError::ExchangeInFlight
                | SessionError::NoExchangeInFlight
                | SessionError::Dead
                | SessionError::Closed => "SessionError",
            },
            Self::Config(_) => "ConfigError",
        }
    }

    /// Returns `true` if the session (or the attempt to open one) is over.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Session(e) => e.is_fatal(),
            Self::Protocol(e) => e.kind() == ErrorKind::Framing,
            Self::Transport(_) | Self::Config(_) => true,
        }
    }
}

fn protocol_kind(e: &ProtocolError) -> &'static str {
    match e.kind() {
        ErrorKind::Encoding => "EncodingError",
        ErrorKind::Validation => "ValidationError",
        ErrorKind::Framing => "FramingError",
        ErrorKind::Payload => "PayloadError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Transport(_)));
        assert!(client_err.to_string().contains("gone"));
        assert_eq!(client_err.kind(), "TransportError");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::validation("gameId", "missing");
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Protocol(_)));
        assert_eq!(client_err.kind(), "ValidationError");
        assert!(!client_err.is_fatal());
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Handshake("no reply within 3s".into());
        let client_err: ClientError = err.into();
        assert!(matches!(client_err, ClientError::Session(_)));
        assert_eq!(client_err.kind(), "HandshakeError");
        assert!(client_err.is_fatal());
    }

    #[test]
    fn test_session_framing_kind_comes_from_protocol() {
        let err: ClientError =
            SessionError::Framing(ProtocolError::Truncated { len: 4 }).into();
        assert_eq!(err.kind(), "FramingError");
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::Invalid {
            var: "TRIVIA_ENDPOINT".into(),
            reason: "bad".into(),
        };
        let client_err: ClientError = err.into();
        assert_eq!(client_err.kind(), "ConfigError");
    }
}
