//! `authenticate` handler

use std::sync::Arc;

use relay_core::{RoomKey, Snowflake};
use serde_json::Value;

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{encode_payload, AuthenticatedPayload, GatewayMessage, ServerEvent};
use crate::server::GatewayState;

/// Binds a session to a user and joins the user's private room
pub struct AuthenticateHandler;

impl AuthenticateHandler {
    /// Handle an `authenticate` event
    ///
    /// The first session of a user announces them online to every session.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        user_id: Snowflake,
    ) -> HandlerResult<Value> {
        let outcome = state
            .registry()
            .authenticate(connection.session_id(), user_id)
            .map_err(|e| {
                tracing::warn!(
                    session_id = %connection.session_id(),
                    user_id = %user_id,
                    error = %e,
                    "Authentication rejected"
                );
                HandlerError::Unauthorized(e.to_string())
            })?;

        state.rooms().join(connection, RoomKey::user(user_id));

        // Before the reply await: cancellation there must not skip the online edge
        if outcome.first_session_for_user {
            state.presence().mark_online(user_id);
        }

        let data = encode_payload(
            ServerEvent::Authenticated.as_str(),
            &AuthenticatedPayload {
                success: true,
                user_id,
            },
        )?;
        connection
            .reply(GatewayMessage::server(ServerEvent::Authenticated, data.clone()))
            .await;

        tracing::info!(
            session_id = %connection.session_id(),
            user_id = %user_id,
            first_session = outcome.first_session_for_user,
            "Session authenticated"
        );

        Ok(data)
    }
}
