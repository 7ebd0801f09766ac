//! `join_conversation` and `send_message` handlers

use std::sync::Arc;

use relay_core::RoomKey;
use relay_service::{MessageService, SendMessageRequest};
use serde_json::{json, Value};

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::{
    encode_payload, GatewayMessage, JoinConversationPayload, JoinedConversationPayload, ServerEvent,
};
use crate::server::GatewayState;

/// Conversation room membership and message sends
pub struct ConversationHandler;

impl ConversationHandler {
    /// Join a conversation room
    pub async fn join(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: JoinConversationPayload,
    ) -> HandlerResult<Value> {
        state
            .rooms()
            .join(connection, RoomKey::conversation(payload.conversation_id));

        let data = encode_payload(
            ServerEvent::JoinedConversation.as_str(),
            &JoinedConversationPayload {
                success: true,
                conversation_id: payload.conversation_id,
            },
        )?;
        connection
            .reply(GatewayMessage::server(ServerEvent::JoinedConversation, data.clone()))
            .await;

        Ok(data)
    }

    /// Run the message pipeline for this session
    ///
    /// Fan-out happens inside the pipeline; the returned value is the ack body.
    pub async fn send_message(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: SendMessageRequest,
    ) -> HandlerResult<Value> {
        let response = MessageService::new(state.service_context())
            .send_message(request, connection.user_id())
            .await?;

        Ok(json!({ "success": true, "data": response }))
    }
}
