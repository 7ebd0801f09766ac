//! Event handlers
//!
//! Decodes inbound frames into typed commands and routes them to the components.
//! Replies and errors go to the originating session only.

mod authenticate;
mod conversation;
mod error;
mod presence;
mod typing;

pub use authenticate::AuthenticateHandler;
pub use conversation::ConversationHandler;
pub use error::{HandlerError, HandlerResult};
pub use presence::PresenceHandler;
pub use typing::TypingHandler;

use std::sync::Arc;

use serde_json::{json, Value};

use crate::connection::Connection;
use crate::protocol::{encode_payload, ClientEvent, GatewayMessage, ServerEvent};
use crate::server::GatewayState;

/// Dispatch incoming client frames to the appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one inbound text frame
    pub async fn dispatch_text(state: &GatewayState, connection: &Arc<Connection>, text: &str) {
        match GatewayMessage::from_json(text) {
            Ok(message) => Self::dispatch(state, connection, message).await,
            Err(e) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    error = %e,
                    "Failed to parse frame"
                );
                let ack = e.ack;
                Self::reply_error(connection, ack, &HandlerError::from(e)).await;
            }
        }
    }

    /// Handle a decoded frame
    ///
    /// A frame with an ack id always gets exactly one ack reply.
    pub async fn dispatch(state: &GatewayState, connection: &Arc<Connection>, message: GatewayMessage) {
        tracing::trace!(
            session_id = %connection.session_id(),
            event = %message.event,
            "Received frame"
        );

        let ack = message.ack;
        let result = match ClientEvent::decode(&message) {
            Ok(event) => Self::route(state, connection, event).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(reply) => {
                if let Some(ack) = ack {
                    connection.reply(GatewayMessage::ack_reply(ack, reply)).await;
                }
            }
            Err(e) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    event = %message.event,
                    stage = %e.stage(),
                    error = %e,
                    "Handler error"
                );
                Self::reply_error(connection, ack, &e).await;
            }
        }
    }

    async fn route(
        state: &GatewayState,
        connection: &Arc<Connection>,
        event: ClientEvent,
    ) -> HandlerResult<Value> {
        match event {
            ClientEvent::Authenticate { user_id } => {
                AuthenticateHandler::handle(state, connection, user_id).await
            }
            ClientEvent::JoinConversation(payload) => {
                ConversationHandler::join(state, connection, payload).await
            }
            ClientEvent::SendMessage(request) => {
                ConversationHandler::send_message(state, connection, request).await
            }
            ClientEvent::Typing(payload) => TypingHandler::start(state, connection, payload),
            ClientEvent::StopTyping(payload) => TypingHandler::stop(state, connection, payload),
            ClientEvent::CheckUserStatus { user_id } => {
                PresenceHandler::check_status(state, user_id)
            }
            ClientEvent::GetOnlineUsers => PresenceHandler::list_online(state),
        }
    }

    async fn reply_error(connection: &Connection, ack: Option<u64>, error: &HandlerError) {
        let body = error.body();
        let message = match ack {
            Some(ack) => GatewayMessage::ack_reply(ack, json!({ "success": false, "error": body })),
            None => match encode_payload(ServerEvent::Error.as_str(), &body) {
                Ok(data) => GatewayMessage::server(ServerEvent::Error, data),
                Err(_) => return,
            },
        };
        connection.reply(message).await;
    }
}
