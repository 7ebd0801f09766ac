//! Conversation database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a conversation row joined with its participants
#[derive(Debug, Clone, FromRow)]
pub struct ConversationModel {
    pub id: i64,
    pub listing_id: i64,
    pub last_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Aggregated from `conversation_participants`
    pub participants: Vec<i64>,
}

impl ConversationModel {
    /// Check if conversation has any message yet
    #[inline]
    pub fn has_messages(&self) -> bool {
        self.last_message_id.is_some()
    }
}
