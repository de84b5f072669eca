//! In-process connection pairs.
//!
//! [`MemoryConnection::pair`] returns two connected ends: whatever one end
//! sends, the other receives, one message at a time. Tests use the far end
//! as a scripted server.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, Mutex, Notify};

use crate::{Connection, ConnectionId, TransportError};

/// One end of an in-memory duplex channel.
pub struct MemoryConnection {
    id: ConnectionId,
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: AtomicBool,
    closing: Notify,
}

impl MemoryConnection {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(
        tx: mpsc::UnboundedSender<Vec<u8>>,
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: ConnectionId::next(),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
            closed: AtomicBool::new(false),
            closing: Notify::new(),
        }
    }

    /// Returns `true` once [`close`](Connection::close) has been called on
    /// this end.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let tx = self.tx.lock().await;
        let tx = tx.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("local end closed".into())
        })?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        // Register for the close notification before checking the flag so
        // a close racing with this call is never missed.
        let closing = self.closing.notified();
        if self.is_closed() {
            return Ok(None);
        }
        let mut rx = self.rx.lock().await;
        tokio::select! {
            msg = rx.recv() => Ok(msg),
            _ = closing => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.closed.store(true, Ordering::Release);
        self.tx.lock().await.take();
        self.closing.notify_waiters();
        tracing::trace!(id = %self.id, "memory connection closed");
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_messages_both_ways() {
        let (a, b) = MemoryConnection::pair();

        a.send(b"ping").await.unwrap();
        assert_eq!(b.recv().await.unwrap(), Some(b"ping".to_vec()));

        b.send(b"pong").await.unwrap();
        assert_eq!(a.recv().await.unwrap(), Some(b"pong".to_vec()));
    }

    #[tokio::test]
    async fn test_close_ends_peer_recv() {
        let (a, b) = MemoryConnection::pair();
        a.close().await.unwrap();
        assert_eq!(b.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (a, _b) = MemoryConnection::pair();
        a.close().await.unwrap();
        let err = a.send(b"late").await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_close_wakes_pending_recv() {
        let (a, _b) = MemoryConnection::pair();
        let a = Arc::new(a);

        let pending = {
            let a = Arc::clone(&a);
            tokio::spawn(async move { a.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        a.close().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("pending recv should not hang")
            .unwrap();
        assert_eq!(result.unwrap(), None);
    }
}
