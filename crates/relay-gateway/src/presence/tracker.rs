//! Presence tracker

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use relay_core::Snowflake;

use crate::connection::ConnectionRegistry;
use crate::protocol::{
    encode_payload, GatewayMessage, PresencePayload, ServerEvent, UserStatusPayload,
};

/// Tracks lastSeen per user and announces online/offline edges
///
/// Records are kept after a user goes offline so `check_user_status` can report when
/// they were last seen; `evict_stale` is the only way they leave the table.
pub struct PresenceTracker {
    registry: Arc<ConnectionRegistry>,
    last_seen: DashMap<Snowflake, DateTime<Utc>>,
}

impl PresenceTracker {
    /// Create a tracker reading online state from `registry`
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            last_seen: DashMap::new(),
        }
    }

    /// Record the offline → online edge and tell every session
    pub fn mark_online(&self, user_id: Snowflake) -> usize {
        self.announce(user_id, true)
    }

    /// Record the online → offline edge and tell every session
    pub fn mark_offline(&self, user_id: Snowflake) -> usize {
        self.announce(user_id, false)
    }

    fn announce(&self, user_id: Snowflake, is_online: bool) -> usize {
        let now = Utc::now();
        self.last_seen.insert(user_id, now);

        let payload = PresencePayload {
            user_id,
            is_online,
            last_seen: Some(now),
        };
        let Ok(data) = encode_payload(ServerEvent::UserOnlineStatus.as_str(), &payload) else {
            return 0;
        };
        let sent = self
            .registry
            .broadcast(&GatewayMessage::server(ServerEvent::UserOnlineStatus, data));

        tracing::info!(user_id = %user_id, is_online, sent, "Presence changed");

        sent
    }

    /// Snapshot of one user's status
    pub fn check_status(&self, user_id: Snowflake) -> UserStatusPayload {
        UserStatusPayload {
            is_online: self.registry.is_online(user_id),
            last_seen: self.last_seen.get(&user_id).map(|r| *r.value()),
        }
    }

    /// Every recorded user, online or previously seen, ordered by user id
    pub fn list_online(&self) -> Vec<PresencePayload> {
        let mut users: Vec<PresencePayload> = self
            .last_seen
            .iter()
            .map(|r| PresencePayload {
                user_id: *r.key(),
                is_online: self.registry.is_online(*r.key()),
                last_seen: Some(*r.value()),
            })
            .collect();

        users.sort_by_key(|p| p.user_id);
        users
    }

    /// Drop offline users last seen more than `retention` ago; returns how many went
    pub fn evict_stale(&self, retention: Duration) -> usize {
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let cutoff = Utc::now() - retention;

        let before = self.last_seen.len();
        self.last_seen
            .retain(|user_id, seen| *seen > cutoff || self.registry.is_online(*user_id));
        let evicted = before.saturating_sub(self.last_seen.len());

        if evicted > 0 {
            tracing::debug!(evicted, "Evicted stale presence records");
        }

        evicted
    }

    /// Number of recorded users
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Check if no user has been recorded
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("recorded", &self.last_seen.len())
            .finish()
    }
}
