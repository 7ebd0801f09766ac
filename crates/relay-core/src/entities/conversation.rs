//! Conversation entity - a buyer/seller thread about one listing

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Snowflake,
    /// The classified listing this conversation is about
    pub listing_id: Snowflake,
    pub participants: Vec<Snowflake>,
    pub last_message_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation without messages
    pub fn new(id: Snowflake, listing_id: Snowflake, participants: Vec<Snowflake>) -> Self {
        let now = Utc::now();
        Self {
            id,
            listing_id,
            participants,
            last_message_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a user takes part in this conversation
    #[inline]
    pub fn has_participant(&self, user_id: Snowflake) -> bool {
        self.participants.contains(&user_id)
    }

    /// Both ends of a message must be participants
    pub fn admits(&self, sender_id: Snowflake, receiver_id: Snowflake) -> bool {
        self.has_participant(sender_id) && self.has_participant(receiver_id)
    }

    /// Point at the most recent message
    pub fn set_last_message(&mut self, message_id: Snowflake) {
        self.last_message_id = Some(message_id);
        self.updated_at = Utc::now();
    }
}
