//! Gateway event names and typed inbound commands

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use relay_core::Snowflake;
use relay_service::{SendMessageRequest, NEW_MESSAGE_NOTIFICATION_EVENT, RECEIVE_MESSAGE_EVENT};

use super::{GatewayMessage, JoinConversationPayload, TypingPayload};

/// Events the server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEvent {
    /// Reply to a frame that carried an ack id
    Ack,
    Authenticated,
    JoinedConversation,
    /// Presence transition, sent to every session
    UserOnlineStatus,
    ReceiveMessage,
    NewMessageNotification,
    DisplayTyping,
    HideTyping,
    /// Failure of a frame that carried no ack id
    Error,
}

impl ServerEvent {
    /// Get the string representation of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::Authenticated => "authenticated",
            Self::JoinedConversation => "joined_conversation",
            Self::UserOnlineStatus => "user_online_status",
            Self::ReceiveMessage => RECEIVE_MESSAGE_EVENT,
            Self::NewMessageNotification => NEW_MESSAGE_NOTIFICATION_EVENT,
            Self::DisplayTyping => "display_typing",
            Self::HideTyping => "hide_typing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client frame decoded into a typed command
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Authenticate { user_id: Snowflake },
    JoinConversation(JoinConversationPayload),
    SendMessage(SendMessageRequest),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
    CheckUserStatus { user_id: Snowflake },
    GetOnlineUsers,
}

/// Why a frame could not become a `ClientEvent`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("invalid {event} payload: {reason}")]
    Invalid { event: &'static str, reason: String },
}

impl ClientEvent {
    /// Decode a frame's event name and payload
    pub fn decode(message: &GatewayMessage) -> Result<Self, PayloadError> {
        let data = message.data_or_null();

        match message.event.as_str() {
            "authenticate" => Ok(Self::Authenticate {
                user_id: parse("authenticate", data)?,
            }),
            "join_conversation" => Ok(Self::JoinConversation(parse("join_conversation", data)?)),
            "send_message" => {
                if !data.is_object() {
                    return Err(PayloadError::Invalid {
                        event: "send_message",
                        reason: "expected an object".to_string(),
                    });
                }
                Ok(Self::SendMessage(parse("send_message", data)?))
            }
            "typing" => Ok(Self::Typing(parse("typing", data)?)),
            "stop_typing" => Ok(Self::StopTyping(parse("stop_typing", data)?)),
            "check_user_status" => Ok(Self::CheckUserStatus {
                user_id: parse("check_user_status", data)?,
            }),
            "get_online_users" => Ok(Self::GetOnlineUsers),
            other => Err(PayloadError::UnknownEvent(other.to_string())),
        }
    }

    /// Event name, for logging
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::JoinConversation(_) => "join_conversation",
            Self::SendMessage(_) => "send_message",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stop_typing",
            Self::CheckUserStatus { .. } => "check_user_status",
            Self::GetOnlineUsers => "get_online_users",
        }
    }
}

fn parse<T: DeserializeOwned>(event: &'static str, data: Value) -> Result<T, PayloadError> {
    serde_json::from_value(data).map_err(|e| PayloadError::Invalid {
        event,
        reason: e.to_string(),
    })
}
