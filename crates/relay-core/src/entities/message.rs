//! Message entity - an immutable chat message between a buyer and a seller

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// A persisted message
///
/// Messages are append-only: once the store has assigned `id` and `created_at`
/// nothing about the row changes through this relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub receiver_id: Snowflake,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Materialize a message from a validated insert and the store-assigned fields
    pub fn from_new(new: NewMessage, id: Snowflake, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            content: new.content,
            is_read: false,
            created_at,
        }
    }

    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// A message that has passed validation and authorization but is not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub receiver_id: Snowflake,
    pub content: String,
}

impl NewMessage {
    /// Create a new insert
    pub fn new(
        conversation_id: Snowflake,
        sender_id: Snowflake,
        receiver_id: Snowflake,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            sender_id,
            receiver_id,
            content: content.into(),
        }
    }
}
