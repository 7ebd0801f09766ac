//! Conversation entity <-> model mapper

use relay_core::entities::Conversation;
use relay_core::value_objects::Snowflake;

use crate::models::ConversationModel;

/// Convert ConversationModel to Conversation entity
impl From<ConversationModel> for Conversation {
    fn from(model: ConversationModel) -> Self {
        Conversation {
            id: Snowflake::new(model.id),
            listing_id: Snowflake::new(model.listing_id),
            participants: model.participants.into_iter().map(Snowflake::new).collect(),
            last_message_id: model.last_message_id.map(Snowflake::new),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
