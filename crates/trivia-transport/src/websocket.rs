//! WebSocket client transport using `tokio-tungstenite`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

type Inbound = Result<Vec<u8>, TransportError>;

/// A client-side WebSocket connection to the game server.
///
/// A background reader task polls the socket for the whole life of the
/// connection, so control frames are handled even while nobody is waiting
/// in [`recv`](Connection::recv): tungstenite answers every server Ping
/// with a Pong as it reads. Data messages are queued for `recv` in arrival
/// order.
pub struct WebSocketConnection {
    id: ConnectionId,
    endpoint: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    inbox: Mutex<mpsc::UnboundedReceiver<Inbound>>,
    reader: JoinHandle<()>,
}

impl WebSocketConnection {
    /// Dials `endpoint` (a `ws://` or `wss://` URL) and completes the
    /// WebSocket upgrade.
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ),
            })?;

        let id = ConnectionId::next();
        tracing::debug!(%id, endpoint, "WebSocket connected");

        let (sink, stream) = ws.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(id, stream, tx));

        Ok(Self {
            id,
            endpoint: endpoint.to_string(),
            sink: Mutex::new(sink),
            inbox: Mutex::new(rx),
            reader,
        })
    }

    /// The URL this connection was dialed with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Reads the socket until it ends, forwarding data messages to `tx`.
///
/// Dropping `tx` on exit is what tells `recv` the connection is gone.
async fn read_loop(
    id: ConnectionId,
    mut stream: SplitStream<WsStream>,
    tx: mpsc::UnboundedSender<Inbound>,
) {
    while let Some(item) = stream.next().await {
        let forwarded = match item {
            Ok(Message::Text(text)) => Ok(text.as_bytes().to_vec()),
            Ok(Message::Binary(data)) => Ok(data.into()),
            Ok(Message::Close(frame)) => {
                tracing::debug!(%id, ?frame, "server closed connection");
                break;
            }
            Ok(Message::Ping(_)) => {
                tracing::trace!(%id, "ping");
                continue;
            }
            Ok(_) => continue,
            Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => break,
            Err(e) => Err(TransportError::ReceiveFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                e,
            ))),
        };
        let failed = forwarded.is_err();
        if tx.send(forwarded).is_err() || failed {
            break;
        }
    }
    tracing::trace!(%id, "reader finished");
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Sends `data` as a single text message.
    ///
    /// The server only accepts text frames, so `data` must be UTF-8.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let text = String::from_utf8(data.to_vec()).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        self.sink
            .lock()
            .await
            .send(Message::text(text))
            .await
            .map_err(|e| match e {
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed => {
                    TransportError::ConnectionClosed(e.to_string())
                }
                other => TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    other,
                )),
            })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match self.inbox.lock().await.recv().await {
            Some(Ok(data)) => Ok(Some(data)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Sends a Close frame and stops the reader, which ends any pending
    /// [`recv`](Connection::recv) with `Ok(None)`.
    async fn close(&self) -> Result<(), Self::Error> {
        let closed = self.sink.lock().await.close().await;
        self.reader.abort();
        match closed {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
