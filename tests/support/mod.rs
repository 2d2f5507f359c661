// Shared primitives for spinning up a relay server and driving raw websocket clients.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

// Upper bound for any single expected message.
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// Start a fresh relay on an ephemeral port and return its websocket URL.
//
// Each test gets its own server so the roster starts empty.
pub async fn spawn_server() -> String {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        street_racer::run(listener).await.expect("server failed");
    });
    format!("ws://{addr}/ws")
}

pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Self {
        // The listener is bound before spawn, so the first connect succeeds.
        let (ws, _) = connect_async(url).await.expect("websocket connect");
        Self { ws }
    }

    pub async fn send(&mut self, value: Value) {
        self.ws
            .send(Message::Text(value.to_string().into()))
            .await
            .expect("send frame");
    }

    pub async fn send_raw(&mut self, message: Message) {
        self.ws.send(message).await.expect("send frame");
    }

    // Next text frame as JSON; panics on timeout or close.
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a message")
                .expect("stream ended")
                .expect("websocket error");
            match frame {
                Message::Text(text) => return serde_json::from_str(&text).expect("valid json"),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame {other:?}"),
            }
        }
    }

    // Next message, asserting its event name.
    pub async fn recv_type(&mut self, event: &str) -> Value {
        let msg = self.recv().await;
        assert_eq!(msg["type"], event, "unexpected message {msg}");
        msg["data"].clone()
    }

    // Asserts that nothing arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(frame))) = tokio::time::timeout(wait, self.ws.next()).await {
            panic!("expected no message, got {frame:?}");
        }
    }

    // Next frame of any kind, or None when the server closed the stream.
    pub async fn next_frame(&mut self) -> Option<Message> {
        tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
            .await
            .expect("timed out waiting for a frame")
            .and_then(Result::ok)
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

// Connect and consume the `init` message; returns the client and its identity.
pub async fn connect_and_init(url: &str) -> (TestClient, String, Value) {
    let mut client = TestClient::connect(url).await;
    let init = client.recv_type("init").await;
    let id = init["id"].as_str().expect("id is a string").to_string();
    (client, id, init)
}
