//! End-to-end tests over real WebSocket connections.

mod helpers;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const WAIT: Duration = Duration::from_secs(5);

/// WebSocket client that splits batched frames into single events.
struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<Value>,
}

impl Client {
    async fn connect(addr: SocketAddr, query: &str) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}/ws?{query}"))
            .await
            .expect("WebSocket handshake failed");
        Self {
            ws,
            pending: VecDeque::new(),
        }
    }

    async fn next_event(&mut self) -> Value {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            let message = timeout(WAIT, self.ws.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Socket ended")
                .expect("Socket read failed");
            if let Message::Text(text) = message {
                for line in text.as_str().split('\n') {
                    self.pending
                        .push_back(serde_json::from_str(line).expect("Event is not JSON"));
                }
            }
        }
    }

    async fn send(&mut self, frame: &str) {
        self.ws
            .send(Message::text(frame))
            .await
            .expect("Socket write failed");
    }

    /// Wait for the server to end the socket, skipping any non-close frames.
    async fn closed_by_server(&mut self) -> bool {
        let ended = timeout(WAIT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        ended.is_ok()
    }
}

#[tokio::test]
async fn test_connect_is_acknowledged_and_broadcast_is_stamped() {
    let app = helpers::TestApp::new();
    let addr = app.serve().await;

    let mut acme = Client::connect(addr, "user_id=5&user_type=2&user_name=Acme").await;
    let ack = acme.next_event().await;
    assert_eq!(ack["event"], "connect");
    assert_eq!(ack["sender"]["id"], 5);
    assert_eq!(ack["sender"]["role"], 2);

    let mut alice = Client::connect(addr, "user_id=7&user_type=1&user_name=alice").await;
    assert_eq!(alice.next_event().await["event"], "connect");

    acme.send(r#"{"event":"chat_message","data":{"ticket_id":1,"message_id":2,"content_type":1,"content":"hi","created_at":"2024-05-01T12:00:00Z"}}"#)
        .await;

    for client in [&mut acme, &mut alice] {
        let event = client.next_event().await;
        assert_eq!(event["event"], "chat_message");
        assert_eq!(event["sender"]["id"], 5);
        assert_eq!(event["sender"]["name"], "Acme");
        assert!(event["timestamp"].is_string());
        assert_eq!(event["data"]["content"], "hi");
    }
}

#[tokio::test]
async fn test_reconnect_closes_previous_socket() {
    let app = helpers::TestApp::new();
    let addr = app.serve().await;

    let mut first = Client::connect(addr, "user_id=7&user_type=1&user_name=alice").await;
    assert_eq!(first.next_event().await["event"], "connect");

    let mut second = Client::connect(addr, "user_id=7&user_type=1&user_name=alice").await;
    assert_eq!(second.next_event().await["event"], "connect");

    assert!(first.closed_by_server().await, "First socket was not closed");
    assert_eq!(app.engine.hub.connection_count(), 1);
    assert_eq!(app.engine.hub.identity_count(), 1);

    // The surviving socket still receives traffic.
    second
        .send(r#"{"event":"typing","receiver":{"id":7,"role":1},"data":{"ticket_id":1,"is_typing":true}}"#)
        .await;
    assert_eq!(second.next_event().await["event"], "typing");
}
