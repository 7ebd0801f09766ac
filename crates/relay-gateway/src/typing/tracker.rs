//! Typing state tracker

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use relay_core::{RoomKey, Snowflake};
use tokio::time::Instant;

use crate::connection::Connection;
use crate::protocol::{encode_payload, GatewayMessage, ServerEvent, TypingPayload};
use crate::rooms::RoomRouter;

#[derive(Debug, Clone)]
struct TypingEntry {
    /// Session that reported typing; it never sees its own indicator
    session_id: String,
    deadline: Instant,
}

/// Active typing entries keyed by (conversation, user)
pub struct TypingStateTracker {
    entries: DashMap<(Snowflake, Snowflake), TypingEntry>,
    timeout: Duration,
    rooms: Arc<RoomRouter>,
}

impl TypingStateTracker {
    /// Create a tracker whose entries expire after `timeout`
    pub fn new(rooms: Arc<RoomRouter>, timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            timeout,
            rooms,
        }
    }

    /// Record (or refresh) an entry and relay `display_typing` to the rest of the room
    pub fn start(&self, origin: &Connection, payload: TypingPayload) -> usize {
        self.entries.insert(
            (payload.conversation_id, payload.user_id),
            TypingEntry {
                session_id: origin.session_id().to_string(),
                deadline: Instant::now() + self.timeout,
            },
        );

        self.relay(ServerEvent::DisplayTyping, payload, Some(origin.session_id()))
    }

    /// Drop an entry and relay `hide_typing` to the rest of the room
    pub fn stop(&self, origin: &Connection, payload: TypingPayload) -> usize {
        self.entries.remove(&(payload.conversation_id, payload.user_id));

        self.relay(ServerEvent::HideTyping, payload, Some(origin.session_id()))
    }

    /// Expire entries past their deadline; returns how many expired
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();

        self.entries.retain(|&(conversation_id, user_id), entry| {
            if entry.deadline <= now {
                expired.push((
                    TypingPayload {
                        conversation_id,
                        user_id,
                    },
                    entry.session_id.clone(),
                ));
                false
            } else {
                true
            }
        });

        for (payload, session_id) in &expired {
            self.relay(ServerEvent::HideTyping, *payload, Some(session_id.as_str()));
        }

        if !expired.is_empty() {
            tracing::debug!(expired = expired.len(), "Typing entries expired");
        }

        expired.len()
    }

    /// Drop every entry reported by a closing session
    pub fn clear_session(&self, session_id: &str) -> usize {
        let mut cleared = Vec::new();

        self.entries.retain(|&(conversation_id, user_id), entry| {
            if entry.session_id == session_id {
                cleared.push(TypingPayload {
                    conversation_id,
                    user_id,
                });
                false
            } else {
                true
            }
        });

        for payload in &cleared {
            self.relay(ServerEvent::HideTyping, *payload, Some(session_id));
        }

        cleared.len()
    }

    /// Check if `user_id` is typing in `conversation_id`
    pub fn is_typing(&self, conversation_id: Snowflake, user_id: Snowflake) -> bool {
        self.entries.contains_key(&(conversation_id, user_id))
    }

    /// Number of active entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody is typing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn relay(&self, event: ServerEvent, payload: TypingPayload, exclude: Option<&str>) -> usize {
        let Ok(data) = encode_payload(event.as_str(), &payload) else {
            return 0;
        };
        self.rooms.broadcast(
            &RoomKey::conversation(payload.conversation_id),
            &GatewayMessage::server(event, data),
            exclude,
        )
    }
}

impl std::fmt::Debug for TypingStateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingStateTracker")
            .field("entries", &self.entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
