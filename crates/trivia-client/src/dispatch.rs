//! The dispatch loop: user selections in, server responses out.
//!
//! One iteration is one lock-step exchange:
//!
//! ```text
//! CommandSource ──Selection──→ Command::from_fields ──→ Session::exchange
//!                                     │                        │
//!                               rejected(..)            deliver(..) / notice(..)
//!                                     └──────→ ResponseSink ←──┘
//! ```
//!
//! The loop owns the session for its whole run and closes it on every exit
//! path, including fatal errors.

use trivia_protocol::{Command, CommandKind, Envelope, Fields, Inbound, ProtocolError};
use trivia_session::{Session, SessionError, SessionIdentity};
use trivia_transport::{Connection, TransportError};

use crate::{ClientConfig, ClientError};

/// What the user asked for next.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Send this command, built from these fields.
    Command(CommandKind, Fields),
    /// Stop the loop and close the session.
    Exit,
}

/// Where commands come from: a console menu, a script, a test.
pub trait CommandSource {
    /// Waits for the next selection. End of input should map to
    /// [`Selection::Exit`].
    async fn next_selection(&mut self) -> Selection;
}

/// Where the loop reports what happened.
///
/// Only [`deliver`](ResponseSink::deliver) is required. The other hooks
/// default to a log line.
pub trait ResponseSink {
    /// A frame from the server: the welcome, a response, or a frame that
    /// arrived alongside one.
    fn deliver(&mut self, envelope: &Envelope);

    /// The command was invalid and nothing was sent.
    fn rejected(&mut self, kind: CommandKind, error: &ProtocolError) {
        tracing::warn!(command = kind.label(), error = %error, "command rejected");
    }

    /// The server answered with an error line.
    fn notice(&mut self, reason: &str) {
        tracing::warn!(reason, "server rejected request");
    }

    /// The response had an unreadable body and was dropped.
    fn dropped(&mut self, error: &ProtocolError) {
        tracing::warn!(error = %error, "dropped malformed response");
    }
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Exchanges that produced a response frame.
    pub exchanges: u64,
    /// Commands refused locally before any I/O.
    pub rejected: u64,
    /// Responses dropped for an unreadable body.
    pub dropped: u64,
    /// Requests the server answered with an error line.
    pub notices: u64,
}

/// Opens a session to the configured endpoint with a fresh client ID.
pub async fn connect(config: &ClientConfig) -> Result<Session, ClientError> {
    let identity = SessionIdentity::generate(config.credential());
    tracing::info!(
        endpoint = %config.endpoint,
        client_id = identity.client_id(),
        "connecting"
    );
    let session = Session::open(&config.endpoint, identity, config.session_config()).await?;
    Ok(session)
}

/// Runs the loop until the source says exit or the session dies.
///
/// The welcome frame is delivered first. The session is closed before this
/// returns, whatever the outcome.
///
/// # Errors
/// A [`ClientError::Session`] carrying the fatal error that ended the
/// session (transport failure, framing error, timeout).
pub async fn run<C, S, R>(
    mut session: Session<C>,
    source: &mut S,
    sink: &mut R,
) -> Result<DispatchSummary, ClientError>
where
    C: Connection<Error = TransportError>,
    S: CommandSource,
    R: ResponseSink,
{
    let result = drive(&mut session, source, sink).await;
    session.close().await;

    match &result {
        Ok(summary) => tracing::info!(?summary, "dispatch finished"),
        Err(e) => tracing::error!(kind = e.kind(), error = %e, "dispatch failed"),
    }
    result
}

async fn drive<C, S, R>(
    session: &mut Session<C>,
    source: &mut S,
    sink: &mut R,
) -> Result<DispatchSummary, ClientError>
where
    C: Connection<Error = TransportError>,
    S: CommandSource,
    R: ResponseSink,
{
    let mut summary = DispatchSummary::default();

    sink.deliver(session.welcome());
    flush_extra(session, sink, &mut summary);

    loop {
        let (kind, fields) = match source.next_selection().await {
            Selection::Command(kind, fields) => (kind, fields),
            Selection::Exit => return Ok(summary),
        };

        let command = match Command::from_fields(kind, &fields) {
            Ok(command) => command,
            Err(e) => {
                summary.rejected += 1;
                sink.rejected(kind, &e);
                continue;
            }
        };

        match session.exchange(&command).await {
            Ok(response) => {
                summary.exchanges += 1;
                sink.deliver(&response);
                flush_extra(session, sink, &mut summary);
            }
            Err(SessionError::Command(e)) => {
                summary.rejected += 1;
                sink.rejected(kind, &e);
            }
            Err(SessionError::Payload(e)) => {
                summary.dropped += 1;
                sink.dropped(&e);
            }
            Err(SessionError::ServerRejected(reason)) => {
                summary.notices += 1;
                sink.notice(&reason);
                flush_extra(session, sink, &mut summary);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Hands over whatever arrived alongside the last response, in order.
fn flush_extra<C, R>(session: &mut Session<C>, sink: &mut R, summary: &mut DispatchSummary)
where
    C: Connection<Error = TransportError>,
    R: ResponseSink,
{
    for item in session.take_extra() {
        match item {
            Inbound::Frame(envelope) => sink.deliver(&envelope),
            Inbound::Notice(notice) => {
                summary.notices += 1;
                sink.notice(&notice.reason);
            }
        }
    }
}
