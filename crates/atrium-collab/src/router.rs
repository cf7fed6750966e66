// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event router: dispatches inbound frames to handlers.
//!
//! Every room-scoped handler first confirms the connection's recorded room
//! matches the event's target room and rejects otherwise with an `error`
//! event and no side effects. Persistence failures are caught per-handler,
//! logged, and surfaced to the originating connection only; they never
//! abort the connection. Broadcasts go to the *other* participants except
//! where noted (`new-message` goes to the whole room so the origin receives
//! the canonical persisted form; save acks go to the origin only).

use std::str::FromStr;

use serde_json::{json, Value};
use tracing::{debug, error, warn};

use atrium_core::{AtriumError, MessageKind};
use atrium_storage::models::NewMessage;
use atrium_storage::queries::{documents, messages, notifications, rooms, whiteboards};

use crate::presence;
use crate::protocol::{
    client, error_frame, frame, server, CursorMovePayload, DocumentCursorPayload,
    DocumentEditPayload, DocumentSavePayload, FileSharePayload, NotificationSendPayload,
    RawFrame, SendMessagePayload, UserStatusPayload, WhiteboardDrawPayload,
    WhiteboardSavePayload,
};
use crate::registry::CursorState;
use crate::{CollabServer, ConnCtx};

/// Extract a room id payload that may be a bare string or `{"roomId": ...}`.
fn room_id_payload(data: &Value) -> Option<String> {
    if let Some(s) = data.as_str() {
        return Some(s.to_string());
    }
    data.get("roomId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

impl CollabServer {
    /// Parse and dispatch one inbound frame.
    ///
    /// Malformed envelopes are logged and skipped without dropping the
    /// connection; unknown event names and unparsable payloads are answered
    /// with an `error` event.
    pub async fn handle_event(&self, ctx: &mut ConnCtx, raw: &str) {
        let parsed: RawFrame = match serde_json::from_str(raw) {
            Ok(f) => f,
            Err(e) => {
                debug!(error = %e, "malformed frame, skipping");
                return;
            }
        };

        match parsed.event.as_str() {
            client::JOIN_ROOM => match room_id_payload(&parsed.data) {
                Some(room_id) => self.handle_join(ctx, room_id).await,
                None => self.send_error(ctx, "invalid join-room payload").await,
            },
            client::LEAVE_ROOM => match room_id_payload(&parsed.data) {
                Some(room_id) => self.handle_leave(ctx, &room_id).await,
                None => self.send_error(ctx, "invalid leave-room payload").await,
            },
            client::SEND_MESSAGE => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_send_message(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid send-message payload").await,
            },
            client::TYPING_START => match room_id_payload(&parsed.data) {
                Some(room_id) => self.handle_typing(ctx, &room_id, true).await,
                None => self.send_error(ctx, "invalid typing-start payload").await,
            },
            client::TYPING_STOP => match room_id_payload(&parsed.data) {
                Some(room_id) => self.handle_typing(ctx, &room_id, false).await,
                None => self.send_error(ctx, "invalid typing-stop payload").await,
            },
            client::WHITEBOARD_DRAW => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_whiteboard_draw(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid whiteboard-draw payload").await,
            },
            client::WHITEBOARD_CLEAR => match room_id_payload(&parsed.data) {
                Some(room_id) => self.handle_whiteboard_clear(ctx, &room_id).await,
                None => self.send_error(ctx, "invalid whiteboard-clear payload").await,
            },
            client::WHITEBOARD_SAVE => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_whiteboard_save(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid whiteboard-save payload").await,
            },
            client::DOCUMENT_EDIT => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_document_edit(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid document-edit payload").await,
            },
            client::DOCUMENT_CURSOR => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_document_cursor(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid document-cursor payload").await,
            },
            client::DOCUMENT_SAVE => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_document_save(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid document-save payload").await,
            },
            client::CURSOR_MOVE => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_cursor_move(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid cursor-move payload").await,
            },
            client::USER_STATUS => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_user_status(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid user-status payload").await,
            },
            client::FILE_SHARE => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_file_share(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid file-share payload").await,
            },
            client::NOTIFICATION_SEND => match serde_json::from_value(parsed.data) {
                Ok(payload) => self.handle_notification_send(ctx, payload).await,
                Err(_) => self.send_error(ctx, "invalid notification-send payload").await,
            },
            other => {
                self.send_error(ctx, &format!("unknown event `{other}`")).await;
            }
        }
    }

    /// Disconnect cleanup: leave the current room (if any) and mark the
    /// user offline. Runs synchronously with respect to the registry.
    pub async fn handle_disconnect(&self, ctx: &mut ConnCtx) {
        if let Some(room_id) = ctx.room_id.take() {
            self.registry().leave(&room_id, &ctx.conn_id);
            let mut left = self.actor(ctx);
            left["connId"] = Value::String(ctx.conn_id.clone());
            self.broadcast(&room_id, Some(&ctx.conn_id), frame(server::USER_LEFT, left))
                .await;
        }
        if let Err(e) = presence::mark_offline(self.db(), &ctx.user_id).await {
            warn!(error = %e, user = %ctx.user_id, "presence offline update failed");
        }
        self.registry().remove_conn(&ctx.conn_id);
    }

    // --- room membership ---

    async fn handle_join(&self, ctx: &mut ConnCtx, room_id: String) {
        // Membership is always re-checked against the persisted participant
        // list; the in-memory registry is never the source of truth.
        let authorized = match rooms::user_can_join(self.db(), &room_id, &ctx.user_id).await {
            Ok(authorized) => authorized,
            Err(e) => {
                error!(error = %e, room = %room_id, "join authorization check failed");
                self.send_error(ctx, "Failed to join room").await;
                return;
            }
        };
        if !authorized {
            self.reject(ctx, AtriumError::Forbidden(room_id)).await;
            return;
        }

        let mut snapshot = self.registry().join(&room_id, &ctx.conn_id);

        // Cold cache entry after restart or GC: rehydrate the most recently
        // saved whiteboard so a fresh join sees the last saved payload.
        if snapshot.whiteboard.is_none() {
            match whiteboards::latest_for_room(self.db(), &room_id).await {
                Ok(Some(saved)) => {
                    let payload = serde_json::from_str(&saved.data)
                        .unwrap_or(Value::String(saved.data));
                    self.registry().set_whiteboard(&room_id, Some(payload.clone()));
                    snapshot.whiteboard = Some(payload);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, room = %room_id, "whiteboard rehydration failed"),
            }
        }

        ctx.room_id = Some(room_id.clone());

        if let Err(e) = presence::mark_online(self.db(), &ctx.user_id, &room_id).await {
            warn!(error = %e, user = %ctx.user_id, "presence online update failed");
        }

        let mut joined = self.actor(ctx);
        joined["connId"] = Value::String(ctx.conn_id.clone());
        self.broadcast(&room_id, Some(&ctx.conn_id), frame(server::USER_JOINED, joined))
            .await;

        self.send_to(ctx, frame(
            server::ROOM_JOINED,
            json!({
                "roomId": room_id,
                "participants": snapshot.participants,
                "whiteboard": snapshot.whiteboard,
                "document": snapshot.document,
            }),
        ))
        .await;
        debug!(user = %ctx.user_id, room = %room_id, "user joined room");
    }

    async fn handle_leave(&self, ctx: &mut ConnCtx, room_id: &str) {
        // Only acts when the recorded room matches; otherwise a no-op.
        if ctx.room_id.as_deref() != Some(room_id) {
            return;
        }
        self.registry().leave(room_id, &ctx.conn_id);
        ctx.room_id = None;

        if let Err(e) = presence::mark_offline(self.db(), &ctx.user_id).await {
            warn!(error = %e, user = %ctx.user_id, "presence offline update failed");
        }

        let mut left = self.actor(ctx);
        left["connId"] = Value::String(ctx.conn_id.clone());
        self.broadcast(room_id, Some(&ctx.conn_id), frame(server::USER_LEFT, left))
            .await;
        debug!(user = %ctx.user_id, room = %room_id, "user left room");
    }

    // --- chat ---

    async fn handle_send_message(&self, ctx: &ConnCtx, payload: SendMessagePayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        if payload.content.len() > self.config().max_message_length {
            self.send_error(ctx, "Message too long").await;
            return;
        }
        let kind = match MessageKind::from_str(&payload.kind.to_lowercase()) {
            Ok(kind) => kind,
            Err(_) => {
                self.send_error(ctx, "Unsupported message type").await;
                return;
            }
        };

        let new = NewMessage {
            room_id: payload.room_id.clone(),
            sender_id: ctx.user_id.clone(),
            content: payload.content,
            kind: kind.to_string(),
            reply_to_id: payload.reply_to_id,
        };
        match messages::create_message(self.db(), new).await {
            Ok(stored) => {
                let data = serde_json::to_value(&stored).unwrap_or(Value::Null);
                // Whole room, origin included: the origin receives the
                // canonical persisted form (id, timestamps, resolved refs).
                self.broadcast(&payload.room_id, None, frame(server::NEW_MESSAGE, data))
                    .await;
            }
            Err(e) => {
                error!(error = %e, room = %payload.room_id, "message persistence failed");
                self.send_error(ctx, "Failed to send message").await;
            }
        }
    }

    async fn handle_typing(&self, ctx: &ConnCtx, room_id: &str, started: bool) {
        if !self.ensure_in_room(ctx, room_id).await {
            return;
        }
        let event = if started { server::TYPING_START } else { server::TYPING_STOP };
        self.broadcast(room_id, Some(&ctx.conn_id), frame(event, self.actor(ctx)))
            .await;
    }

    // --- whiteboard ---

    async fn handle_whiteboard_draw(&self, ctx: &ConnCtx, payload: WhiteboardDrawPayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        self.registry()
            .set_whiteboard(&payload.room_id, Some(payload.drawing_data.clone()));

        let mut data = self.actor(ctx);
        data["drawingData"] = payload.drawing_data;
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::WHITEBOARD_DRAW, data))
            .await;
    }

    async fn handle_whiteboard_clear(&self, ctx: &ConnCtx, room_id: &str) {
        if !self.ensure_in_room(ctx, room_id).await {
            return;
        }
        self.registry().set_whiteboard(room_id, None);
        self.broadcast(room_id, Some(&ctx.conn_id), frame(server::WHITEBOARD_CLEAR, self.actor(ctx)))
            .await;
    }

    async fn handle_whiteboard_save(&self, ctx: &ConnCtx, payload: WhiteboardSavePayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        let data = payload.canvas_data.to_string();
        match whiteboards::upsert_whiteboard(self.db(), &payload.room_id, &ctx.user_id, &data).await
        {
            Ok(()) => {
                self.registry()
                    .set_whiteboard(&payload.room_id, Some(payload.canvas_data));
                // Ack to the sender only.
                self.send_to(ctx, frame(server::WHITEBOARD_SAVED, json!({ "roomId": payload.room_id })))
                    .await;
            }
            Err(e) => {
                error!(error = %e, room = %payload.room_id, "whiteboard persistence failed");
                self.send_error(ctx, "Failed to save whiteboard").await;
            }
        }
    }

    // --- documents ---

    async fn handle_document_edit(&self, ctx: &ConnCtx, payload: DocumentEditPayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        // Stateless relay of the edit operation; no merge is attempted.
        let mut data = self.actor(ctx);
        data["documentId"] = Value::String(payload.document_id);
        data["operation"] = payload.operation;
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::DOCUMENT_EDIT, data))
            .await;
    }

    async fn handle_document_cursor(&self, ctx: &ConnCtx, payload: DocumentCursorPayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        let mut data = self.actor(ctx);
        data["documentId"] = Value::String(payload.document_id);
        data["cursor"] = payload.cursor;
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::DOCUMENT_CURSOR, data))
            .await;
    }

    async fn handle_document_save(&self, ctx: &ConnCtx, payload: DocumentSavePayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        match documents::save_document(self.db(), &payload.document_id, &payload.content, &ctx.user_id)
            .await
        {
            Ok(version) => {
                self.registry().set_document(
                    &payload.room_id,
                    Some(json!({
                        "documentId": payload.document_id,
                        "content": payload.content,
                        "version": version,
                    })),
                );
                self.send_to(ctx, frame(
                    server::DOCUMENT_SAVED,
                    json!({ "documentId": payload.document_id, "version": version }),
                ))
                .await;
            }
            Err(e) => {
                error!(error = %e, document = %payload.document_id, "document persistence failed");
                self.send_error(ctx, "Failed to save document").await;
            }
        }
    }

    // --- presence relays ---

    async fn handle_cursor_move(&self, ctx: &ConnCtx, payload: CursorMovePayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        self.registry().set_cursor(
            &payload.room_id,
            &ctx.conn_id,
            CursorState {
                user_id: ctx.user_id.clone(),
                user_name: ctx.user_name.clone(),
                x: payload.x,
                y: payload.y,
            },
        );
        let mut data = self.actor(ctx);
        data["x"] = json!(payload.x);
        data["y"] = json!(payload.y);
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::CURSOR_MOVE, data))
            .await;
    }

    async fn handle_user_status(&self, ctx: &ConnCtx, payload: UserStatusPayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        let mut data = self.actor(ctx);
        data["status"] = Value::String(payload.status);
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::USER_STATUS, data))
            .await;
    }

    // --- files & notifications ---

    async fn handle_file_share(&self, ctx: &ConnCtx, payload: FileSharePayload) {
        if !self.ensure_in_room(ctx, &payload.room_id).await {
            return;
        }
        let file_name = payload
            .file_info
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("file")
            .to_string();

        let mut data = self.actor(ctx);
        data["fileInfo"] = payload.file_info;
        data["timestamp"] = Value::String(chrono::Utc::now().to_rfc3339());
        self.broadcast(&payload.room_id, Some(&ctx.conn_id), frame(server::FILE_SHARE, data))
            .await;

        // Synthesize a chat message announcing the share.
        self.handle_send_message(ctx, SendMessagePayload {
            content: format!("Shared file: {file_name}"),
            kind: "file".to_string(),
            room_id: payload.room_id,
            reply_to_id: None,
        })
        .await;
    }

    async fn handle_notification_send(&self, ctx: &ConnCtx, payload: NotificationSendPayload) {
        match notifications::create_notification(
            self.db(),
            &payload.user_id,
            &payload.title,
            &payload.content,
            &payload.kind.to_lowercase(),
        )
        .await
        {
            Ok(stored) => {
                // Delivered only to the target user's live connections,
                // never to the room.
                let data = serde_json::to_value(&stored).unwrap_or(Value::Null);
                let message = frame(server::NOTIFICATION, data);
                for sender in self.registry().user_senders(&payload.user_id) {
                    let _ = sender.send(message.clone()).await;
                }
            }
            Err(e) => {
                error!(error = %e, target = %payload.user_id, "notification persistence failed");
                self.send_error(ctx, "Failed to send notification").await;
            }
        }
    }

    // --- plumbing ---

    /// `{userId, userName}` payload base for broadcast events.
    fn actor(&self, ctx: &ConnCtx) -> Value {
        json!({ "userId": ctx.user_id, "userName": ctx.user_name })
    }

    async fn ensure_in_room(&self, ctx: &ConnCtx, room_id: &str) -> bool {
        if ctx.room_id.as_deref() == Some(room_id) {
            true
        } else {
            self.reject(ctx, AtriumError::NotInRoom(room_id.to_string())).await;
            false
        }
    }

    /// Reject an event: log the typed rejection, emit a client-facing
    /// `error` event, leave the connection alive.
    async fn reject(&self, ctx: &ConnCtx, err: AtriumError) {
        debug!(error = %err, user = %ctx.user_id, "event rejected");
        let message = match &err {
            AtriumError::Forbidden(_) => "Room not found or access denied",
            AtriumError::NotInRoom(_) => "Not in specified room",
            _ => "Request failed",
        };
        self.send_error(ctx, message).await;
    }

    async fn send_to(&self, ctx: &ConnCtx, message: String) {
        if let Some(sender) = self.registry().conn_sender(&ctx.conn_id) {
            let _ = sender.send(message).await;
        }
    }

    async fn send_error(&self, ctx: &ConnCtx, message: &str) {
        self.send_to(ctx, error_frame(message)).await;
    }

    async fn broadcast(&self, room_id: &str, exclude: Option<&str>, message: String) {
        for sender in self.registry().recipients(room_id, exclude) {
            let _ = sender.send(message.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::mpsc;

    use atrium_config::model::{CollabConfig, StorageConfig};
    use atrium_core::Identity;
    use atrium_storage::queries::{documents, messages, presence as presence_queries, rooms, users};
    use atrium_storage::{Database, StoreSessionVerifier};

    use crate::{CollabServer, ConnCtx};

    struct TestClient {
        ctx: ConnCtx,
        rx: mpsc::Receiver<String>,
    }

    impl TestClient {
        /// Next outbound frame, parsed, or panic after a short wait.
        async fn recv(&mut self) -> Value {
            let raw = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
                .await
                .expect("timed out waiting for frame")
                .expect("sender dropped");
            serde_json::from_str(&raw).expect("frame must be JSON")
        }

        fn try_recv(&mut self) -> Option<Value> {
            self.rx
                .try_recv()
                .ok()
                .map(|raw| serde_json::from_str(&raw).expect("frame must be JSON"))
        }
    }

    async fn setup() -> (Arc<CollabServer>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage_config = StorageConfig {
            database_path: dir.path().join("collab.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&storage_config).await.unwrap();

        users::create_user(&db, "alice", "Alice", "alice@example.com").await.unwrap();
        users::create_user(&db, "bob", "Bob", "bob@example.com").await.unwrap();
        users::create_user(&db, "carol", "Carol", "carol@example.com").await.unwrap();
        rooms::create_room(&db, "room-1", "Kickoff", "alice").await.unwrap();
        rooms::add_participant(&db, "room-1", "bob").await.unwrap();

        let verifier = Arc::new(StoreSessionVerifier::new(db.clone()));
        let server = CollabServer::new(db, verifier, CollabConfig::default());
        (server, dir)
    }

    fn connect(server: &Arc<CollabServer>, user_id: &str, user_name: &str) -> TestClient {
        let conn_id = format!("conn-{user_id}");
        let (tx, rx) = mpsc::channel(64);
        server.register_conn(
            &conn_id,
            &Identity {
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
            },
            tx,
        );
        TestClient {
            ctx: ConnCtx {
                conn_id,
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                room_id: None,
            },
            rx,
        }
    }

    async fn join(server: &Arc<CollabServer>, client: &mut TestClient, room_id: &str) -> Value {
        server
            .handle_event(&mut client.ctx, &format!(r#"{{"event":"join-room","data":"{room_id}"}}"#))
            .await;
        client.recv().await
    }

    #[tokio::test]
    async fn authorized_join_returns_room_state() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");

        let joined = join(&server, &mut alice, "room-1").await;
        assert_eq!(joined["event"], "room-joined");
        assert_eq!(joined["data"]["roomId"], "room-1");
        assert_eq!(joined["data"]["participants"].as_array().unwrap().len(), 1);
        assert!(joined["data"]["whiteboard"].is_null());
        assert_eq!(server.registry().room_len("room-1"), 1);

        let p = presence_queries::get_presence(server.db(), "alice")
            .await
            .unwrap()
            .unwrap();
        assert!(p.is_online);
        assert_eq!(p.room_id.as_deref(), Some("room-1"));
    }

    #[tokio::test]
    async fn unauthorized_join_is_rejected_without_side_effects() {
        let (server, _dir) = setup().await;
        let mut carol = connect(&server, "carol", "Carol");

        let reply = join(&server, &mut carol, "room-1").await;
        assert_eq!(reply["event"], "error");
        assert_eq!(reply["data"]["message"], "Room not found or access denied");
        assert_eq!(server.registry().room_len("room-1"), 0);
        assert!(carol.ctx.room_id.is_none());
    }

    #[tokio::test]
    async fn join_notifies_existing_participants() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");

        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;

        let seen = alice.recv().await;
        assert_eq!(seen["event"], "user-joined");
        assert_eq!(seen["data"]["userId"], "bob");
        assert_eq!(seen["data"]["userName"], "Bob");
    }

    #[tokio::test]
    async fn chat_message_reaches_room_with_resolved_sender() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await; // bob's user-joined

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"send-message","data":{"content":"hello","type":"TEXT","roomId":"room-1"}}"#,
            )
            .await;

        let received = bob.recv().await;
        assert_eq!(received["event"], "new-message");
        assert_eq!(received["data"]["content"], "hello");
        assert_eq!(received["data"]["sender"]["id"], "alice");
        assert_eq!(received["data"]["kind"], "text");

        // The origin receives the canonical persisted form too.
        let echoed = alice.recv().await;
        assert_eq!(echoed["event"], "new-message");
        assert_eq!(echoed["data"]["id"], received["data"]["id"]);

        assert_eq!(messages::count_for_room(server.db(), "room-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn message_outside_room_is_rejected_without_persisting() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"send-message","data":{"content":"hi","roomId":"room-1"}}"#,
            )
            .await;

        let reply = alice.recv().await;
        assert_eq!(reply["event"], "error");
        assert_eq!(reply["data"]["message"], "Not in specified room");
        assert_eq!(messages::count_for_room(server.db(), "room-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        join(&server, &mut alice, "room-1").await;

        let big = "x".repeat(CollabConfig::default().max_message_length + 1);
        server
            .handle_event(
                &mut alice.ctx,
                &format!(r#"{{"event":"send-message","data":{{"content":"{big}","roomId":"room-1"}}}}"#),
            )
            .await;

        let reply = alice.recv().await;
        assert_eq!(reply["event"], "error");
        assert_eq!(reply["data"]["message"], "Message too long");
    }

    #[tokio::test]
    async fn typing_indicator_goes_to_others_only() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await;

        server
            .handle_event(&mut alice.ctx, r#"{"event":"typing-start","data":"room-1"}"#)
            .await;

        let seen = bob.recv().await;
        assert_eq!(seen["event"], "typing-start");
        assert_eq!(seen["data"]["userId"], "alice");
        assert!(alice.try_recv().is_none(), "origin must not receive its own typing event");
    }

    #[tokio::test]
    async fn whiteboard_save_round_trips_to_fresh_join() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        join(&server, &mut alice, "room-1").await;

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"whiteboard-save","data":{"roomId":"room-1","canvasData":{"strokes":[1,2]}}}"#,
            )
            .await;
        let ack = alice.recv().await;
        assert_eq!(ack["event"], "whiteboard-saved");

        // Alice leaves; the room entry is garbage-collected.
        server
            .handle_event(&mut alice.ctx, r#"{"event":"leave-room","data":"room-1"}"#)
            .await;
        assert!(!server.registry().has_room("room-1"));

        // A fresh join by a different participant sees the saved payload.
        let mut bob = connect(&server, "bob", "Bob");
        let joined = join(&server, &mut bob, "room-1").await;
        assert_eq!(joined["data"]["whiteboard"]["strokes"], serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn whiteboard_draw_updates_cache_and_relays() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await;

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"whiteboard-draw","data":{"roomId":"room-1","drawingData":{"line":7}}}"#,
            )
            .await;

        let seen = bob.recv().await;
        assert_eq!(seen["event"], "whiteboard-draw");
        assert_eq!(seen["data"]["drawingData"]["line"], 7);
        assert!(alice.try_recv().is_none());
    }

    #[tokio::test]
    async fn document_save_acks_increasing_versions() {
        let (server, _dir) = setup().await;
        documents::create_document(server.db(), "doc-1", "room-1", "Notes")
            .await
            .unwrap();
        let mut alice = connect(&server, "alice", "Alice");
        join(&server, &mut alice, "room-1").await;

        for expected in 1..=2_i64 {
            server
                .handle_event(
                    &mut alice.ctx,
                    &format!(
                        r#"{{"event":"document-save","data":{{"roomId":"room-1","documentId":"doc-1","content":"rev {expected}"}}}}"#
                    ),
                )
                .await;
            let ack = alice.recv().await;
            assert_eq!(ack["event"], "document-saved");
            assert_eq!(ack["data"]["version"], expected);
        }

        assert_eq!(documents::count_versions(server.db(), "doc-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn document_save_failure_surfaces_error_to_origin_only() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await;

        // Document does not exist; the save must fail atomically.
        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"document-save","data":{"roomId":"room-1","documentId":"ghost","content":"x"}}"#,
            )
            .await;

        let reply = alice.recv().await;
        assert_eq!(reply["event"], "error");
        assert!(bob.try_recv().is_none(), "bystanders must not see the failure");
    }

    #[tokio::test]
    async fn file_share_relays_then_synthesizes_file_message() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await;

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"file-share","data":{"roomId":"room-1","fileInfo":{"name":"deck.pdf","size":12345}}}"#,
            )
            .await;

        let shared = bob.recv().await;
        assert_eq!(shared["event"], "file-share");
        assert_eq!(shared["data"]["fileInfo"]["name"], "deck.pdf");

        let message = bob.recv().await;
        assert_eq!(message["event"], "new-message");
        assert_eq!(message["data"]["kind"], "file");
        assert_eq!(message["data"]["content"], "Shared file: deck.pdf");
    }

    #[tokio::test]
    async fn notification_targets_only_the_recipient() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        let mut bob = connect(&server, "bob", "Bob");
        join(&server, &mut alice, "room-1").await;
        join(&server, &mut bob, "room-1").await;
        alice.recv().await;

        server
            .handle_event(
                &mut alice.ctx,
                r#"{"event":"notification-send","data":{"userId":"bob","title":"Ping","content":"Check the doc"}}"#,
            )
            .await;

        let seen = bob.recv().await;
        assert_eq!(seen["event"], "notification");
        assert_eq!(seen["data"]["title"], "Ping");
        assert!(alice.try_recv().is_none(), "room must not receive the notification");
    }

    #[tokio::test]
    async fn disconnect_cleans_registry_and_presence() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        join(&server, &mut alice, "room-1").await;
        assert_eq!(server.registry().room_len("room-1"), 1);

        server.handle_disconnect(&mut alice.ctx).await;

        assert!(!server.registry().has_room("room-1"));
        assert_eq!(server.registry().conn_count(), 0);
        let p = presence_queries::get_presence(server.db(), "alice")
            .await
            .unwrap()
            .unwrap();
        assert!(!p.is_online);
    }

    #[tokio::test]
    async fn unknown_event_yields_error() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");

        server
            .handle_event(&mut alice.ctx, r#"{"event":"teleport","data":{}}"#)
            .await;
        let reply = alice.recv().await;
        assert_eq!(reply["event"], "error");
        assert!(reply["data"]["message"].as_str().unwrap().contains("teleport"));
    }

    #[tokio::test]
    async fn malformed_frame_is_skipped_silently() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");

        server.handle_event(&mut alice.ctx, "this is not json").await;
        assert!(alice.try_recv().is_none());
    }

    #[tokio::test]
    async fn leave_for_wrong_room_is_a_noop() {
        let (server, _dir) = setup().await;
        let mut alice = connect(&server, "alice", "Alice");
        join(&server, &mut alice, "room-1").await;

        server
            .handle_event(&mut alice.ctx, r#"{"event":"leave-room","data":"other-room"}"#)
            .await;
        assert_eq!(alice.ctx.room_id.as_deref(), Some("room-1"));
        assert_eq!(server.registry().room_len("room-1"), 1);
    }
}
