//! The session: one handshaken connection driven in lock-step.
//!
//! ```text
//!            send()                    receive_next()
//!   Ready ───────────→ AwaitingResponse ─────────────→ Ready
//!     │                      │
//!     │ transport/framing    │ transport/framing/timeout
//!     └──────────→ Dead ←────┘
//!
//!   any state ──close()──→ Closed
//! ```
//!
//! At most one request is outstanding. The next response read off the
//! connection is the answer to it.

use std::collections::VecDeque;
use std::time::Duration;

use trivia_protocol::{
    decode_batch, Command, Envelope, ErrorKind, Inbound, ProtocolError,
};
use trivia_transport::{Connection, ConnectionId, TransportError, WebSocketConnection};

use crate::{SessionError, SessionIdentity};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for the server's reply to `HELO`.
    ///
    /// Default: 3 seconds.
    pub handshake_timeout: Duration,

    /// How long to wait for each response. `None` waits indefinitely;
    /// closing the session is then the only way to abandon an exchange.
    pub response_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(3),
            response_timeout: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake done, no request outstanding.
    Ready,
    /// A request was sent and its response has not been read yet.
    AwaitingResponse,
    /// A fatal error occurred. Only `close` is meaningful now.
    Dead,
    /// Closed locally.
    Closed,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A handshaken connection to the game server.
///
/// `send` and `receive_next` take `&mut self`, so a session has exactly
/// one driver at a time. Close it with [`Session::close`] on every exit
/// path.
pub struct Session<C: Connection<Error = TransportError> = WebSocketConnection> {
    conn: C,
    identity: SessionIdentity,
    config: SessionConfig,
    state: SessionState,
    welcome: Envelope,
    /// Items that arrived in the same message as an earlier response.
    extra: VecDeque<Inbound>,
    exchanges: u64,
}

impl Session<WebSocketConnection> {
    /// Dials `endpoint` and performs the handshake.
    ///
    /// # Errors
    /// [`SessionError::Transport`] if the endpoint can't be reached, or
    /// [`SessionError::Handshake`] if the server doesn't accept us.
    pub async fn open(
        endpoint: &str,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let conn = WebSocketConnection::connect(endpoint).await?;
        tracing::debug!(endpoint, id = %conn.id(), "connected");
        Self::handshake(conn, identity, config).await
    }
}

impl<C: Connection<Error = TransportError>> Session<C> {
    /// Performs the handshake over an already-established connection.
    ///
    /// Sends `HELO` with the identity's client ID and credential, then waits
    /// up to `config.handshake_timeout` for the server's first frame. That
    /// frame becomes the [`welcome`](Session::welcome).
    ///
    /// On any failure the connection is closed before returning.
    pub async fn handshake(
        conn: C,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let frame = match identity.handshake().and_then(|helo| helo.encode()) {
            Ok(frame) => frame,
            Err(e) => {
                return Err(abort(&conn, format!("invalid identity: {e}")).await);
            }
        };

        if let Err(e) = conn.send(&frame).await {
            return Err(abort(&conn, format!("sending HELO failed: {e}")).await);
        }

        let reply =
            match tokio::time::timeout(config.handshake_timeout, conn.recv()).await {
                Ok(Ok(Some(bytes))) => bytes,
                Ok(Ok(None)) => {
                    return Err(abort(&conn, "connection closed before reply".into()).await);
                }
                Ok(Err(e)) => {
                    return Err(abort(&conn, format!("receive failed: {e}")).await);
                }
                Err(_) => {
                    let reason =
                        format!("no reply within {:?}", config.handshake_timeout);
                    return Err(abort(&conn, reason).await);
                }
            };

        let mut items = match decode_batch(&reply) {
            Ok(items) => VecDeque::from(items),
            Err(e) => {
                return Err(abort(&conn, format!("unreadable reply: {e}")).await);
            }
        };
        let welcome = match items.pop_front() {
            Some(Inbound::Frame(welcome)) => welcome,
            Some(Inbound::Notice(notice)) => {
                let reason = format!("server rejected HELO: {}", notice.reason);
                return Err(abort(&conn, reason).await);
            }
            None => return Err(abort(&conn, "empty reply".into()).await),
        };

        tracing::info!(
            id = %conn.id(),
            client_id = identity.client_id(),
            welcome = %welcome.tag,
            "session ready"
        );

        Ok(Self {
            conn,
            identity,
            config,
            state: SessionState::Ready,
            welcome,
            extra: items,
            exchanges: 0,
        })
    }

    /// Validates, encodes and sends one command.
    ///
    /// # Errors
    /// - [`SessionError::ExchangeInFlight`] if the previous response hasn't
    ///   been read.
    /// - [`SessionError::Command`] if the command is invalid; nothing is sent
    ///   and the session stays ready.
    /// - [`SessionError::Transport`] if the send fails; the session is dead.
    pub async fn send(&mut self, command: &Command) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let frame = command.encode().map_err(SessionError::Command)?;
        self.transmit(command.tag(), &frame).await
    }

    /// Sends an arbitrary envelope, for tags outside the command catalog.
    pub async fn send_envelope(
        &mut self,
        envelope: &Envelope,
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let frame = envelope.encode().map_err(SessionError::Command)?;
        self.transmit(envelope.tag.as_str(), &frame).await
    }

    /// Waits for the response to the outstanding request.
    ///
    /// If the server coalesced several items into one message, the first
    /// answers the request and the rest are kept for
    /// [`take_extra`](Session::take_extra).
    ///
    /// # Errors
    /// - [`SessionError::NoExchangeInFlight`] if nothing was sent.
    /// - [`SessionError::ServerRejected`] if the server answered with an
    ///   error line. The exchange is over; the session stays usable.
    /// - [`SessionError::Payload`] if the body was unreadable. The message
    ///   is dropped; the session stays usable.
    /// - [`SessionError::Transport`], [`SessionError::Framing`] or
    ///   [`SessionError::Timeout`] end the session.
    pub async fn receive_next(&mut self) -> Result<Envelope, SessionError> {
        match self.state {
            SessionState::AwaitingResponse => {}
            SessionState::Ready => return Err(SessionError::NoExchangeInFlight),
            SessionState::Dead => return Err(SessionError::Dead),
            SessionState::Closed => return Err(SessionError::Closed),
        }

        let received = match self.config.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    self.state = SessionState::Dead;
                    tracing::warn!(id = %self.conn.id(), ?limit, "response timed out");
                    return Err(SessionError::Timeout(limit));
                }
            },
            None => self.conn.recv().await,
        };

        let bytes = match received {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.state = SessionState::Dead;
                tracing::warn!(id = %self.conn.id(), "server closed the connection");
                return Err(SessionError::Transport(TransportError::ConnectionClosed(
                    "server closed the connection".into(),
                )));
            }
            Err(e) => {
                self.state = SessionState::Dead;
                tracing::warn!(id = %self.conn.id(), error = %e, "receive failed");
                return Err(SessionError::Transport(e));
            }
        };

        match decode_batch(&bytes) {
            Ok(items) => {
                self.state = SessionState::Ready;
                let mut items = VecDeque::from(items);
                let first = items.pop_front();
                self.extra.extend(items);
                match first {
                    Some(Inbound::Frame(response)) => {
                        self.exchanges += 1;
                        tracing::debug!(
                            tag = %response.tag,
                            extra = self.extra.len(),
                            "received response"
                        );
                        Ok(response)
                    }
                    Some(Inbound::Notice(notice)) => {
                        tracing::debug!(reason = %notice.reason, "server rejected request");
                        Err(SessionError::ServerRejected(notice.reason))
                    }
                    None => Err(SessionError::Payload(ProtocolError::EmptyPayload)),
                }
            }
            Err(e) if e.kind() == ErrorKind::Framing => {
                self.state = SessionState::Dead;
                tracing::warn!(len = bytes.len(), error = %e, "framing error");
                Err(SessionError::Framing(e))
            }
            Err(e) => {
                self.state = SessionState::Ready;
                tracing::warn!(error = %e, "dropping malformed message");
                Err(SessionError::Payload(e))
            }
        }
    }

    /// Sends `command` and waits for its response.
    pub async fn exchange(&mut self, command: &Command) -> Result<Envelope, SessionError> {
        self.send(command).await?;
        self.receive_next().await
    }

    /// Drains frames and error lines that arrived alongside earlier
    /// responses, oldest first.
    pub fn take_extra(&mut self) -> Vec<Inbound> {
        self.extra.drain(..).collect()
    }

    /// Closes the connection. Safe to call more than once.
    ///
    /// Errors from the transport are logged, not returned: after `close` the
    /// session is closed either way.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        if let Err(e) = self.conn.close().await {
            tracing::debug!(id = %self.conn.id(), error = %e, "error while closing");
        }
        tracing::info!(
            id = %self.conn.id(),
            exchanges = self.exchanges,
            "session closed"
        );
    }

    /// The first frame the server sent after accepting `HELO`.
    pub fn welcome(&self) -> &Envelope {
        &self.welcome
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Number of completed request/response exchanges.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::AwaitingResponse => Err(SessionError::ExchangeInFlight),
            SessionState::Dead => Err(SessionError::Dead),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    async fn transmit(&mut self, tag: &str, frame: &[u8]) -> Result<(), SessionError> {
        if let Err(e) = self.conn.send(frame).await {
            self.state = SessionState::Dead;
            tracing::warn!(id = %self.conn.id(), tag, error = %e, "send failed");
            return Err(SessionError::Transport(e));
        }
        self.state = SessionState::AwaitingResponse;
        tracing::debug!(id = %self.conn.id(), tag, len = frame.len(), "sent request");
        Ok(())
    }
}

/// Closes `conn` after a failed handshake and builds the error.
async fn abort<C: Connection>(conn: &C, reason: String) -> SessionError {
    tracing::warn!(id = %conn.id(), %reason, "handshake failed");
    if let Err(e) = conn.close().await {
        tracing::debug!(id = %conn.id(), error = %e, "error while closing");
    }
    SessionError::Handshake(reason)
}
