//! Room membership and fan-out

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use relay_core::{EventPublisher, RoomKey};
use serde_json::Value;

use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::GatewayMessage;

/// Maps room keys to member sessions and delivers events to them
pub struct RoomRouter {
    registry: Arc<ConnectionRegistry>,
    rooms: DashMap<RoomKey, HashSet<String>>,
}

impl RoomRouter {
    /// Create a router resolving members through `registry`
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            rooms: DashMap::new(),
        }
    }

    /// Add a session to a room; returns false if it was already a member
    pub fn join(&self, connection: &Connection, room: RoomKey) -> bool {
        let joined = self
            .rooms
            .entry(room)
            .or_default()
            .insert(connection.session_id().to_string());
        connection.add_room(room);

        if joined {
            tracing::debug!(session_id = %connection.session_id(), %room, "Joined room");
        }

        joined
    }

    /// Remove a session from every room it joined
    pub fn leave_all(&self, connection: &Connection) {
        for room in connection.take_rooms() {
            self.rooms.remove_if_mut(&room, |_, members| {
                members.remove(connection.session_id());
                members.is_empty()
            });
        }
    }

    /// Deliver to every member of `room` except `exclude_session`
    ///
    /// Each member gets a non-blocking send; a saturated member loses the event without
    /// delaying the rest. Returns how many members accepted it.
    pub fn broadcast(
        &self,
        room: &RoomKey,
        message: &GatewayMessage,
        exclude_session: Option<&str>,
    ) -> usize {
        let members: Vec<String> = match self.rooms.get(room) {
            Some(members) => members.iter().cloned().collect(),
            None => return 0,
        };

        let mut sent = 0;
        let mut gone = Vec::new();
        for session_id in members {
            if exclude_session == Some(session_id.as_str()) {
                continue;
            }
            match self.registry.get(&session_id) {
                Some(conn) => {
                    if conn.try_send(message.clone()) {
                        sent += 1;
                    }
                }
                None => gone.push(session_id),
            }
        }

        if !gone.is_empty() {
            self.rooms.remove_if_mut(room, |_, members| {
                for session_id in &gone {
                    members.remove(session_id);
                }
                members.is_empty()
            });
        }

        tracing::trace!(%room, event = %message.event, sent, "Room broadcast");

        sent
    }

    /// Session ids currently in `room`
    pub fn members(&self, room: &RoomKey) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl EventPublisher for RoomRouter {
    fn publish(&self, room: &RoomKey, event: &str, payload: &Value) -> usize {
        self.broadcast(room, &GatewayMessage::event(event, payload.clone()), None)
    }
}

impl std::fmt::Debug for RoomRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRouter")
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
