//! Gateway payload structures
//!
//! Typed payloads for inbound events and the outbound events the gateway itself emits.
//! Message payloads live in `relay-service`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relay_core::Snowflake;

// ============================================================================
// Inbound
// ============================================================================

/// `join_conversation` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConversationPayload {
    pub conversation_id: Snowflake,
}

/// `typing` / `stop_typing` payload, relayed unchanged as `display_typing` / `hide_typing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: Snowflake,
    pub user_id: Snowflake,
}

// ============================================================================
// Outbound
// ============================================================================

/// `authenticated` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPayload {
    pub success: bool,
    pub user_id: Snowflake,
}

/// `joined_conversation` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedConversationPayload {
    pub success: bool,
    pub conversation_id: Snowflake,
}

/// `user_online_status` payload, also one entry of the `get_online_users` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: Snowflake,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

/// `check_user_status` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}
