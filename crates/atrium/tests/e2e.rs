// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the combined server.
//!
//! Each test binds an ephemeral port, serves the real router (collaboration
//! WebSocket + billing webhook) against a temp SQLite database, and drives
//! it with real clients. Tests are independent and order-insensitive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use atrium_billing::{WebhookState, SIGNATURE_HEADER};
use atrium_collab::CollabServer;
use atrium_config::model::{CollabConfig, StorageConfig};
use atrium_core::SessionVerifier;
use atrium_storage::queries::{
    customers, presence, rooms, sessions, subscriptions, users, webhook_events,
};
use atrium_storage::{Database, StoreSessionVerifier};

const SECRET: &str = "whsec_e2e";

struct Harness {
    addr: SocketAddr,
    db: Database,
    _dir: tempfile::TempDir,
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl Harness {
    /// Seeded users alice (creator of room-1, token tok-alice) and bob
    /// (participant, token tok-bob); carol (token tok-carol) is neither.
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage_config = StorageConfig {
            database_path: dir.path().join("e2e.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&storage_config).await.unwrap();

        users::create_user(&db, "alice", "Alice", "alice@example.com").await.unwrap();
        users::create_user(&db, "bob", "Bob", "bob@example.com").await.unwrap();
        users::create_user(&db, "carol", "Carol", "carol@example.com").await.unwrap();
        sessions::create_session(&db, "tok-alice", "alice", None).await.unwrap();
        sessions::create_session(&db, "tok-bob", "bob", None).await.unwrap();
        sessions::create_session(&db, "tok-carol", "carol", None).await.unwrap();
        rooms::create_room(&db, "room-1", "Kickoff", "alice").await.unwrap();
        rooms::add_participant(&db, "room-1", "bob").await.unwrap();

        let verifier: Arc<dyn SessionVerifier> = Arc::new(StoreSessionVerifier::new(db.clone()));
        let collab = CollabServer::new(db.clone(), verifier, CollabConfig::default());
        let app = collab.router().merge(atrium_billing::router(WebhookState {
            db: db.clone(),
            secret: SECRET.to_string(),
            tolerance_secs: 300,
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, db, _dir: dir }
    }

    async fn connect(&self, token: &str) -> WsClient {
        let url = format!("ws://{}/ws?token={token}", self.addr);
        let (stream, _response) = connect_async(&url).await.expect("upgrade should succeed");
        stream
    }

    /// Minimal HTTP POST over a raw TCP stream; returns the status code.
    async fn http_post(&self, path: &str, headers: &[(&str, String)], body: &str) -> u16 {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let mut request = format!(
            "POST {path} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.addr,
            body.len()
        );
        for (name, value) in headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        stream.write_all(body.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let head = String::from_utf8_lossy(&response);
        head.split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("response must carry a status code")
    }
}

async fn send(ws: &mut WsClient, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

async fn recv(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

fn signed_header(body: &str) -> (&'static str, String) {
    let now = chrono::Utc::now().timestamp();
    (
        SIGNATURE_HEADER,
        atrium_billing::signature::sign(SECRET, now, body.as_bytes()).unwrap(),
    )
}

#[tokio::test]
async fn websocket_handshake_requires_valid_token() {
    let harness = Harness::start().await;

    let url = format!("ws://{}/ws?token=tok-bogus", harness.addr);
    let result = connect_async(&url).await;
    assert!(result.is_err(), "bogus token must be refused before upgrade");

    let url = format!("ws://{}/ws", harness.addr);
    let result = connect_async(&url).await;
    assert!(result.is_err(), "missing token must be refused before upgrade");
}

#[tokio::test]
async fn chat_round_trip_between_two_clients() {
    let harness = Harness::start().await;
    let mut alice = harness.connect("tok-alice").await;
    let mut bob = harness.connect("tok-bob").await;

    send(&mut alice, "join-room", json!("room-1")).await;
    let joined = recv(&mut alice).await;
    assert_eq!(joined["event"], "room-joined");

    send(&mut bob, "join-room", json!("room-1")).await;
    let joined = recv(&mut bob).await;
    assert_eq!(joined["event"], "room-joined");
    assert_eq!(joined["data"]["participants"].as_array().unwrap().len(), 2);

    // Alice sees bob arrive.
    let arrival = recv(&mut alice).await;
    assert_eq!(arrival["event"], "user-joined");
    assert_eq!(arrival["data"]["userId"], "bob");

    send(
        &mut alice,
        "send-message",
        json!({"content": "hello", "type": "TEXT", "roomId": "room-1"}),
    )
    .await;

    let received = recv(&mut bob).await;
    assert_eq!(received["event"], "new-message");
    assert_eq!(received["data"]["content"], "hello");
    assert_eq!(received["data"]["sender"]["id"], "alice");
    assert_eq!(received["data"]["sender"]["name"], "Alice");
}

#[tokio::test]
async fn unauthorized_join_gets_error_event() {
    let harness = Harness::start().await;
    let mut carol = harness.connect("tok-carol").await;

    send(&mut carol, "join-room", json!("room-1")).await;
    let reply = recv(&mut carol).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "Room not found or access denied");
}

#[tokio::test]
async fn abrupt_disconnect_marks_user_offline() {
    let harness = Harness::start().await;
    let mut alice = harness.connect("tok-alice").await;

    send(&mut alice, "join-room", json!("room-1")).await;
    recv(&mut alice).await;

    // Drop the connection without leave-room.
    drop(alice);

    // Cleanup is asynchronous relative to the socket close; poll briefly.
    let mut offline = false;
    for _ in 0..50 {
        if let Some(p) = presence::get_presence(&harness.db, "alice").await.unwrap() {
            if !p.is_online {
                offline = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(offline, "presence must show offline after disconnect");
}

#[tokio::test]
async fn whiteboard_save_survives_to_next_join() {
    let harness = Harness::start().await;
    let mut alice = harness.connect("tok-alice").await;

    send(&mut alice, "join-room", json!("room-1")).await;
    recv(&mut alice).await;
    send(
        &mut alice,
        "whiteboard-save",
        json!({"roomId": "room-1", "canvasData": {"strokes": [3, 1, 4]}}),
    )
    .await;
    let ack = recv(&mut alice).await;
    assert_eq!(ack["event"], "whiteboard-saved");

    let mut bob = harness.connect("tok-bob").await;
    send(&mut bob, "join-room", json!("room-1")).await;
    let joined = recv(&mut bob).await;
    assert_eq!(joined["data"]["whiteboard"]["strokes"], json!([3, 1, 4]));
}

#[tokio::test]
async fn webhook_end_to_end_with_idempotent_redelivery() {
    let harness = Harness::start().await;

    let customer = json!({
        "id": "evt_cus",
        "type": "customer.created",
        "data": {"object": {"id": "cus_1", "email": "alice@example.com", "name": "Alice"}}
    })
    .to_string();
    let status = harness
        .http_post("/webhooks/payments", &[signed_header(&customer)], &customer)
        .await;
    assert_eq!(status, 200);

    let subscription = json!({
        "id": "evt_sub",
        "type": "customer.subscription.updated",
        "data": {"object": {"id": "sub_1", "customer": "cus_1", "status": "active"}}
    })
    .to_string();
    for _ in 0..2 {
        let status = harness
            .http_post("/webhooks/payments", &[signed_header(&subscription)], &subscription)
            .await;
        assert_eq!(status, 200);
    }

    assert!(customers::find_by_provider_id(&harness.db, "cus_1").await.unwrap().is_some());
    let sub = subscriptions::find_by_provider_id(&harness.db, "sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sub.status, "active");
    // Two distinct events recorded, no duplicate row for the redelivery.
    assert_eq!(webhook_events::count_events(&harness.db).await.unwrap(), 2);
}

#[tokio::test]
async fn webhook_rejects_unsigned_requests() {
    let harness = Harness::start().await;
    let body = json!({"id": "evt_x", "type": "customer.created",
                      "data": {"object": {"id": "cus_x", "email": "x@example.com"}}})
        .to_string();

    let status = harness.http_post("/webhooks/payments", &[], &body).await;
    assert_eq!(status, 400);
    assert_eq!(webhook_events::count_events(&harness.db).await.unwrap(), 0);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let harness = Harness::start().await;
    let mut stream = TcpStream::connect(harness.addr).await.unwrap();
    stream
        .write_all(
            format!(
                "GET /health HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
                harness.addr
            )
            .as_bytes(),
        )
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.1 200"));
    assert!(text.contains("\"status\":\"ok\""));
}
