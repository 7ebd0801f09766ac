//! `typing` / `stop_typing` handlers

use std::sync::Arc;

use serde_json::{json, Value};

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::TypingPayload;
use crate::server::GatewayState;

/// Relays typing indicators to the rest of a conversation room
pub struct TypingHandler;

impl TypingHandler {
    /// Handle a `typing` event
    pub fn start(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: TypingPayload,
    ) -> HandlerResult<Value> {
        Self::check_identity(connection, &payload)?;
        state.typing().start(connection, payload);
        Ok(json!({ "success": true }))
    }

    /// Handle a `stop_typing` event
    pub fn stop(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: TypingPayload,
    ) -> HandlerResult<Value> {
        Self::check_identity(connection, &payload)?;
        state.typing().stop(connection, payload);
        Ok(json!({ "success": true }))
    }

    fn check_identity(connection: &Connection, payload: &TypingPayload) -> HandlerResult<()> {
        match connection.user_id() {
            Some(user_id) if user_id != payload.user_id => Err(HandlerError::Unauthorized(
                "userId does not match the authenticated user".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
