//! Response DTOs for gateway events and acknowledgements

use chrono::{DateTime, Utc};
use serde::Serialize;

use relay_core::entities::{Message, UserProfile};
use relay_core::value_objects::Snowflake;

use crate::services::{SendStage, ServiceError};

/// Sender identity attached to a delivered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderPayload {
    pub id: Snowflake,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<UserProfile> for SenderPayload {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            avatar: profile.avatar,
        }
    }
}

/// `receive_message` payload, also the success data of a `send_message` ack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender: SenderPayload,
    pub receiver_id: Snowflake,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageResponse {
    pub fn new(message: Message, sender: UserProfile) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender: sender.into(),
            receiver_id: message.receiver_id,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

/// `new_message_notification` payload sent to the receiver's private room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub message_id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&MessageResponse> for NotificationPayload {
    fn from(message: &MessageResponse) -> Self {
        Self {
            message_id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender.id,
            sender_name: message.sender.name.clone(),
            content: message.content.clone(),
            timestamp: message.created_at,
        }
    }
}

/// Error object carried by failed acks and `error` events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub stage: SendStage,
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

impl ErrorBody {
    pub fn new(stage: SendStage, error: &ServiceError) -> Self {
        Self {
            stage,
            code: error.error_code().to_string(),
            message: error.to_string(),
            retriable: error.is_retriable(),
        }
    }
}
