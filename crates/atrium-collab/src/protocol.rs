// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol for the collaboration WebSocket.
//!
//! Both directions carry JSON envelopes:
//! ```json
//! {"event": "send-message", "data": {"content": "hi", "roomId": "room-1"}}
//! ```
//!
//! Client payload fields are camelCase. Events whose payload is a bare room
//! id (`join-room`, `leave-room`, `typing-start`, `typing-stop`,
//! `whiteboard-clear`) carry the id as a JSON string in `data`.

use serde::Deserialize;
use serde_json::Value;

/// Client -> server event names.
pub mod client {
    pub const JOIN_ROOM: &str = "join-room";
    pub const LEAVE_ROOM: &str = "leave-room";
    pub const SEND_MESSAGE: &str = "send-message";
    pub const TYPING_START: &str = "typing-start";
    pub const TYPING_STOP: &str = "typing-stop";
    pub const WHITEBOARD_DRAW: &str = "whiteboard-draw";
    pub const WHITEBOARD_CLEAR: &str = "whiteboard-clear";
    pub const WHITEBOARD_SAVE: &str = "whiteboard-save";
    pub const DOCUMENT_EDIT: &str = "document-edit";
    pub const DOCUMENT_CURSOR: &str = "document-cursor";
    pub const DOCUMENT_SAVE: &str = "document-save";
    pub const CURSOR_MOVE: &str = "cursor-move";
    pub const USER_STATUS: &str = "user-status";
    pub const FILE_SHARE: &str = "file-share";
    pub const NOTIFICATION_SEND: &str = "notification-send";
}

/// Server -> client event names.
pub mod server {
    pub const ROOM_JOINED: &str = "room-joined";
    pub const USER_JOINED: &str = "user-joined";
    pub const USER_LEFT: &str = "user-left";
    pub const NEW_MESSAGE: &str = "new-message";
    pub const TYPING_START: &str = "typing-start";
    pub const TYPING_STOP: &str = "typing-stop";
    pub const WHITEBOARD_DRAW: &str = "whiteboard-draw";
    pub const WHITEBOARD_CLEAR: &str = "whiteboard-clear";
    pub const WHITEBOARD_SAVED: &str = "whiteboard-saved";
    pub const DOCUMENT_EDIT: &str = "document-edit";
    pub const DOCUMENT_CURSOR: &str = "document-cursor";
    pub const DOCUMENT_SAVED: &str = "document-saved";
    pub const CURSOR_MOVE: &str = "cursor-move";
    pub const USER_STATUS: &str = "user-status";
    pub const FILE_SHARE: &str = "file-share";
    pub const NOTIFICATION: &str = "notification";
    pub const ERROR: &str = "error";
}

/// An inbound envelope before event-specific payload parsing.
#[derive(Debug, Deserialize)]
pub struct RawFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Serialize an outbound envelope.
pub fn frame(event: &str, data: Value) -> String {
    serde_json::json!({ "event": event, "data": data }).to_string()
}

/// Serialize an `error` envelope.
pub fn error_frame(message: &str) -> String {
    frame(server::ERROR, serde_json::json!({ "message": message }))
}

fn default_message_kind() -> String {
    "text".to_string()
}

fn default_notification_kind() -> String {
    "system".to_string()
}

/// Payload for `send-message`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub content: String,
    /// Message kind tag; matched case-insensitively against `text`/`file`/`system`.
    #[serde(rename = "type", default = "default_message_kind")]
    pub kind: String,
    pub room_id: String,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

/// Payload for `whiteboard-draw`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardDrawPayload {
    pub room_id: String,
    pub drawing_data: Value,
}

/// Payload for `whiteboard-save`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardSavePayload {
    pub room_id: String,
    pub canvas_data: Value,
}

/// Payload for `document-edit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEditPayload {
    pub room_id: String,
    pub document_id: String,
    pub operation: Value,
}

/// Payload for `document-cursor`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCursorPayload {
    pub room_id: String,
    pub document_id: String,
    pub cursor: Value,
}

/// Payload for `document-save`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSavePayload {
    pub room_id: String,
    pub document_id: String,
    pub content: String,
}

/// Payload for `cursor-move`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorMovePayload {
    pub room_id: String,
    pub x: f64,
    pub y: f64,
}

/// Payload for `user-status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    pub room_id: String,
    pub status: String,
}

/// Payload for `file-share`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSharePayload {
    pub room_id: String,
    pub file_info: Value,
}

/// Payload for `notification-send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSendPayload {
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default = "default_notification_kind")]
    pub kind: String,
}
