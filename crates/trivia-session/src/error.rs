//! Error types for the session layer.

use std::time::Duration;

use trivia_protocol::ProtocolError;
use trivia_transport::TransportError;

/// Errors that can occur while opening or driving a session.
///
/// Some of these end the session and some don't; [`SessionError::is_fatal`]
/// tells them apart. After a fatal error every further call on the session
/// fails with [`SessionError::Dead`] or [`SessionError::Closed`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The HELO exchange did not complete: the send failed, the connection
    /// closed, the server rejected the credential, or no reply arrived in
    /// time. The connection has already been closed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The underlying connection failed or was closed by the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An inbound message was too short to carry a tag. The byte stream can
    /// no longer be trusted, so the session is marked dead.
    #[error("framing error: {0}")]
    Framing(#[source] ProtocolError),

    /// An inbound message had a valid tag field but an unreadable body.
    /// The message is dropped and the session stays usable.
    #[error("dropped malformed message: {0}")]
    Payload(#[source] ProtocolError),

    /// The server answered the request with an error line instead of a
    /// frame.
    #[error("server rejected request: {0}")]
    ServerRejected(String),

    /// The command failed validation or encoding; nothing was sent.
    #[error("command not sent: {0}")]
    Command(#[source] ProtocolError),

    /// `send` was called while the previous request still awaits its
    /// response.
    #[error("a request is already awaiting its response")]
    ExchangeInFlight,

    /// `receive_next` was called with no request outstanding.
    #[error("no request is awaiting a response")]
    NoExchangeInFlight,

    /// No response arrived within the configured response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// A previous fatal error ended this session.
    #[error("session is dead")]
    Dead,

    /// The session was closed locally.
    #[error("session is closed")]
    Closed,
}

impl SessionError {
    /// Returns `true` if this error ended the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Handshake(_)
                | Self::Transport(_)
                | Self::Framing(_)
                | Self::Timeout(_)
                | Self::Dead
                | Self::Closed
        )
    }
}
