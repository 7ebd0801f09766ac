//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection and its state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use relay_core::{RoomKey, Snowflake};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;

use crate::protocol::{CloseCode, GatewayMessage};

/// Work item for a session's writer task
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Text frame
    Message(GatewayMessage),
    /// Transport-level liveness probe
    Ping,
    /// Close the socket with a gateway close code
    Close(CloseCode),
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique session ID
    session_id: String,

    /// Owning user; set once by `authenticate` and never changed
    user_id: RwLock<Option<Snowflake>>,

    /// Bounded queue drained by the writer task
    sender: mpsc::Sender<Outbound>,

    /// Rooms this session has joined
    rooms: Mutex<HashSet<RoomKey>>,

    /// Last inbound traffic of any kind
    last_activity: Mutex<Instant>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(session_id: String, sender: mpsc::Sender<Outbound>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            user_id: RwLock::new(None),
            sender,
            rooms: Mutex::new(HashSet::new()),
            last_activity: Mutex::new(Instant::now()),
            created_at: Instant::now(),
        })
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the user ID (if authenticated)
    pub fn user_id(&self) -> Option<Snowflake> {
        *self.user_id.read()
    }

    /// Check if the connection is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.user_id.read().is_some()
    }

    /// Bind the session to `user_id` unless it already has an owner
    ///
    /// Returns the owner after the call: `user_id` on success, the existing owner otherwise.
    pub(crate) fn bind_user(&self, user_id: Snowflake) -> Snowflake {
        *self.user_id.write().get_or_insert(user_id)
    }

    // === Rooms ===

    /// Record a joined room; returns false if it was already joined
    pub(crate) fn add_room(&self, room: RoomKey) -> bool {
        self.rooms.lock().insert(room)
    }

    /// Take every joined room, leaving the set empty
    pub(crate) fn take_rooms(&self) -> Vec<RoomKey> {
        self.rooms.lock().drain().collect()
    }

    /// Check if this session joined `room`
    pub fn in_room(&self, room: &RoomKey) -> bool {
        self.rooms.lock().contains(room)
    }

    // === Liveness ===

    /// Record inbound traffic
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last inbound traffic
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    // === Outbound ===

    /// Queue a fan-out message without waiting
    ///
    /// A full or closed queue drops the message; returns whether it was queued.
    pub fn try_send(&self, message: GatewayMessage) -> bool {
        match self.sender.try_send(Outbound::Message(message)) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    dropped = ?dropped,
                    "Outbound queue full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(session_id = %self.session_id, "Outbound queue closed");
                false
            }
        }
    }

    /// Queue a reply to this session's own request, waiting for queue space
    pub async fn reply(&self, message: GatewayMessage) -> bool {
        self.sender.send(Outbound::Message(message)).await.is_ok()
    }

    /// Ask the writer task to send a ping
    pub fn ping(&self) -> bool {
        self.sender.try_send(Outbound::Ping).is_ok()
    }

    /// Ask the writer task to close the socket
    pub fn close(&self, code: CloseCode) {
        if self.sender.try_send(Outbound::Close(code)).is_err() {
            tracing::debug!(session_id = %self.session_id, %code, "Could not queue close frame");
        }
    }

    /// Check if the writer task is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id())
            .field("rooms", &self.rooms.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message() -> GatewayMessage {
        GatewayMessage::event("display_typing", json!({}))
    }

    #[test]
    fn test_connection_creation() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new("session123".to_string(), tx);

        assert_eq!(conn.session_id(), "session123");
        assert!(conn.user_id().is_none());
        assert!(!conn.is_authenticated());
    }

    #[test]
    fn test_bind_user_is_first_writer_wins() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new("session123".to_string(), tx);

        let alice = Snowflake::new(1);
        let bob = Snowflake::new(2);

        assert_eq!(conn.bind_user(alice), alice);
        assert_eq!(conn.bind_user(bob), alice);
        assert_eq!(conn.user_id(), Some(alice));
    }

    #[test]
    fn test_rooms() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new("session123".to_string(), tx);
        let room = RoomKey::conversation(Snowflake::new(100));

        assert!(conn.add_room(room));
        assert!(!conn.add_room(room));
        assert!(conn.in_room(&room));

        assert_eq!(conn.take_rooms(), vec![room]);
        assert!(!conn.in_room(&room));
    }

    #[test]
    fn test_try_send_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let conn = Connection::new("session123".to_string(), tx);

        assert!(conn.try_send(message()));
        assert!(!conn.try_send(message()));

        assert!(matches!(rx.try_recv(), Ok(Outbound::Message(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_try_send_after_writer_gone() {
        let (tx, rx) = mpsc::channel(4);
        let conn = Connection::new("session123".to_string(), tx);
        drop(rx);

        assert!(conn.is_closed());
        assert!(!conn.try_send(message()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tracking() {
        let (tx, _rx) = mpsc::channel(4);
        let conn = Connection::new("session123".to_string(), tx);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(conn.idle_for() >= Duration::from_secs(30));

        conn.touch();
        assert!(conn.idle_for() < Duration::from_secs(1));
    }
}
