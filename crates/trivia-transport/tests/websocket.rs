//! Integration tests for the WebSocket client transport.
//!
//! Each test stands up a bare `tokio-tungstenite` server on a random port
//! and drives [`WebSocketConnection`] against it, so frames really cross a
//! socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use trivia_transport::{Connection, TransportError, WebSocketConnection};

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a random port and returns it with its `ws://` URL.
    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        (listener, format!("ws://{addr}"))
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade should succeed")
    }

    #[tokio::test]
    async fn test_websocket_connect_and_send_receive() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move { accept(&listener).await });

        let client = WebSocketConnection::connect(&url)
            .await
            .expect("client should connect");
        let mut server_ws = server.await.expect("task should complete");

        assert!(client.id().into_inner() > 0);
        assert_eq!(client.endpoint(), url);

        // --- Client sends, server receives a text frame ---
        client
            .send(b"HELO                            {}")
            .await
            .expect("send should succeed");
        let msg = server_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "frames must go out as text");
        assert_eq!(
            msg.into_data().as_ref(),
            b"HELO                            {}"
        );

        // --- Server sends, client receives ---
        server_ws
            .send(Message::text("GAMES                           []"))
            .await
            .unwrap();
        let received = client
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"GAMES                           []");

        client.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_server_close() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            ws.send(Message::Close(None)).await.unwrap();
            // Keep draining so the close handshake can finish.
            while ws.next().await.is_some() {}
        });

        let client = WebSocketConnection::connect(&url).await.unwrap();
        let result = client.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_close_unblocks_pending_recv() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            // Echo nothing; just answer the close handshake.
            while ws.next().await.is_some() {}
        });

        let client = std::sync::Arc::new(
            WebSocketConnection::connect(&url).await.unwrap(),
        );
        let pending = {
            let client = std::sync::Arc::clone(&client);
            tokio::spawn(async move { client.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        client.close().await.expect("close should not block on recv");

        let result = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("pending recv must not hang after close")
            .unwrap();
        assert!(matches!(result, Ok(None) | Err(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_idle_connection_answers_ping() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            ws.send(Message::Ping("keepalive".into())).await.unwrap();
            // The game server drops clients that miss its pong deadline.
            let reply = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("pong should arrive before the deadline")
                .expect("stream should stay open")
                .expect("frame should be valid");
            assert!(
                matches!(&reply, Message::Pong(payload) if &payload[..] == b"keepalive"),
                "expected Pong, got {reply:?}"
            );
            ws.send(Message::text("GAMES                           []"))
                .await
                .unwrap();
            while ws.next().await.is_some() {}
        });

        // Nobody calls recv while the server waits for its pong.
        let client = WebSocketConnection::connect(&url).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let received = client.recv().await.unwrap().expect("connection alive");
        assert_eq!(received, b"GAMES                           []");

        client.close().await.unwrap();
        server.await.expect("server assertions should hold");
    }

    #[tokio::test]
    async fn test_websocket_connect_refused_is_connect_failed() {
        // Bind then drop to get a port nobody listens on.
        let (listener, url) = listen().await;
        drop(listener);

        let err = WebSocketConnection::connect(&url)
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
        assert!(err.to_string().contains(&url));
    }
}
