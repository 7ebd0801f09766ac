//! Message entity <-> model mapper

use relay_core::entities::{Message, NewMessage};
use relay_core::value_objects::Snowflake;

use crate::models::MessageModel;

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            conversation_id: Snowflake::new(model.conversation_id),
            sender_id: Snowflake::new(model.sender_id),
            receiver_id: Snowflake::new(model.receiver_id),
            content: model.content,
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

/// Values bound into the messages insert
pub struct MessageInsert<'a> {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: &'a str,
}

impl<'a> MessageInsert<'a> {
    pub fn new(id: Snowflake, message: &'a NewMessage) -> Self {
        Self {
            id: id.into_inner(),
            conversation_id: message.conversation_id.into_inner(),
            sender_id: message.sender_id.into_inner(),
            receiver_id: message.receiver_id.into_inner(),
            content: &message.content,
        }
    }
}
