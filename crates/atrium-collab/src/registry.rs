// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory room registry.
//!
//! The registry is a derived cache of live connections and last-broadcast
//! payloads. It is rebuilt empty after a restart and is never consulted for
//! authorization -- membership is always re-checked against the persisted
//! participant list on join. Whiteboard/document payloads are last write
//! observed wins: no merge is attempted, so concurrent edits can drop
//! intermediate states (known limitation).
//!
//! Map guards are never held across await points; mutations happen under
//! the shard lock, then sender handles are snapshotted for broadcasting.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Outbound handle for one live connection.
#[derive(Clone)]
pub struct ConnHandle {
    pub user_id: String,
    pub user_name: String,
    pub sender: mpsc::Sender<String>,
}

/// Last observed cursor position for a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    pub user_id: String,
    pub user_name: String,
    pub x: f64,
    pub y: f64,
}

/// Ephemeral per-room state.
#[derive(Default)]
pub struct RoomState {
    pub participants: HashSet<String>,
    pub whiteboard: Option<Value>,
    pub document: Option<Value>,
    pub cursors: HashMap<String, CursorState>,
}

/// Snapshot of a room's ephemeral state, returned to a joining connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub participants: Vec<String>,
    pub whiteboard: Option<Value>,
    pub document: Option<Value>,
}

/// Connection and room maps shared by all handler tasks.
#[derive(Default)]
pub struct Registry {
    conns: DashMap<String, ConnHandle>,
    rooms: DashMap<String, RoomState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection's outbound handle.
    pub fn add_conn(&self, conn_id: &str, handle: ConnHandle) {
        self.conns.insert(conn_id.to_string(), handle);
    }

    /// Drop a connection's outbound handle.
    pub fn remove_conn(&self, conn_id: &str) {
        self.conns.remove(conn_id);
    }

    /// Number of live connections (all rooms).
    pub fn conn_count(&self) -> usize {
        self.conns.len()
    }

    /// Add a connection to a room, creating the room entry if absent.
    /// Returns the post-join snapshot sent back to the joining connection.
    pub fn join(&self, room_id: &str, conn_id: &str) -> RoomSnapshot {
        let mut room = self.rooms.entry(room_id.to_string()).or_default();
        room.participants.insert(conn_id.to_string());
        RoomSnapshot {
            participants: room.participants.iter().cloned().collect(),
            whiteboard: room.whiteboard.clone(),
            document: room.document.clone(),
        }
    }

    /// Remove a connection from a room; garbage-collect the entry when the
    /// participant set empties. Durable room state is untouched.
    pub fn leave(&self, room_id: &str, conn_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.participants.remove(conn_id);
            room.cursors.remove(conn_id);
        }
        self.rooms
            .remove_if(room_id, |_, room| room.participants.is_empty());
    }

    /// Number of connections currently joined to a room.
    pub fn room_len(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.participants.len())
            .unwrap_or(0)
    }

    /// Whether a room entry currently exists.
    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Overwrite the room's ephemeral whiteboard payload.
    pub fn set_whiteboard(&self, room_id: &str, payload: Option<Value>) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.whiteboard = payload;
        }
    }

    /// Overwrite the room's ephemeral document payload.
    pub fn set_document(&self, room_id: &str, payload: Option<Value>) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.document = payload;
        }
    }

    /// Record a connection's cursor position.
    pub fn set_cursor(&self, room_id: &str, conn_id: &str, cursor: CursorState) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.cursors.insert(conn_id.to_string(), cursor);
        }
    }

    /// Outbound sender for a single connection, if still live.
    pub fn conn_sender(&self, conn_id: &str) -> Option<mpsc::Sender<String>> {
        self.conns.get(conn_id).map(|h| h.sender.clone())
    }

    /// Snapshot the outbound senders of a room's participants, optionally
    /// excluding the originating connection.
    pub fn recipients(&self, room_id: &str, exclude: Option<&str>) -> Vec<mpsc::Sender<String>> {
        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        room.participants
            .iter()
            .filter(|conn_id| Some(conn_id.as_str()) != exclude)
            .filter_map(|conn_id| self.conns.get(conn_id).map(|h| h.sender.clone()))
            .collect()
    }

    /// Snapshot the outbound senders of every live connection owned by a
    /// user (personal notification channel).
    pub fn user_senders(&self, user_id: &str) -> Vec<mpsc::Sender<String>> {
        self.conns
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().sender.clone())
            .collect()
    }
}
