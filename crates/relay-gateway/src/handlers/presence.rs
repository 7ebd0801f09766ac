//! `check_user_status` / `get_online_users` handlers

use relay_core::Snowflake;
use serde_json::Value;

use super::HandlerResult;
use crate::protocol::encode_payload;
use crate::server::GatewayState;

/// Answers presence queries from the tracker's snapshot
pub struct PresenceHandler;

impl PresenceHandler {
    /// `{isOnline, lastSeen}` for one user
    pub fn check_status(state: &GatewayState, user_id: Snowflake) -> HandlerResult<Value> {
        Ok(encode_payload(
            "check_user_status",
            &state.presence().check_status(user_id),
        )?)
    }

    /// Every recorded user
    pub fn list_online(state: &GatewayState) -> HandlerResult<Value> {
        Ok(encode_payload("get_online_users", &state.presence().list_online())?)
    }
}
