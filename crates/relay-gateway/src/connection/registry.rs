//! Connection registry
//!
//! Owns every live session and the user → sessions index. All updates to one user's
//! session set happen under that user's DashMap shard lock, so presence edges are
//! computed exactly once; different users only contend when they share a shard.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use relay_core::Snowflake;
use tokio::sync::mpsc;

use super::{Connection, Outbound};
use crate::protocol::GatewayMessage;

/// Result of binding a session to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated {
    /// The user had no other session before this one
    pub first_session_for_user: bool,
    /// The session was already bound to the same user; nothing changed
    pub already_bound: bool,
}

/// Why a session could not be bound
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticateError {
    #[error("session {0} is not registered")]
    UnknownSession(String),

    #[error("session is already authenticated as {current}")]
    BoundToOtherUser { current: Snowflake },
}

/// Result of removing a session
#[derive(Debug)]
pub struct Unregistered {
    pub connection: Arc<Connection>,
    /// Owner of the removed session, if it had authenticated
    pub user_id: Option<Snowflake>,
    /// The owner has no session left
    pub last_session_for_user: bool,
}

/// Registry of all active WebSocket sessions
pub struct ConnectionRegistry {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,

    /// User ID to session IDs mapping; a key exists only while its set is non-empty
    user_sessions: DashMap<Snowflake, HashSet<String>>,
}

impl ConnectionRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_sessions: DashMap::new(),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Generate a new session ID
    #[must_use]
    pub fn generate_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Register an unauthenticated session
    pub fn register(&self, sender: mpsc::Sender<Outbound>) -> Arc<Connection> {
        let session_id = Self::generate_session_id();
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), Arc::clone(&connection));

        tracing::debug!(session_id = %session_id, "Session registered");

        connection
    }

    /// Bind a session to a user
    ///
    /// Re-binding to the same user is a no-op; binding to a different user is refused
    /// and the session keeps its original owner.
    pub fn authenticate(
        &self,
        session_id: &str,
        user_id: Snowflake,
    ) -> Result<Authenticated, AuthenticateError> {
        let connection = self
            .get(session_id)
            .ok_or_else(|| AuthenticateError::UnknownSession(session_id.to_string()))?;

        let mut sessions = self.user_sessions.entry(user_id).or_default();

        let owner = connection.bind_user(user_id);
        if owner != user_id {
            let empty = sessions.is_empty();
            drop(sessions);
            if empty {
                self.user_sessions.remove_if(&user_id, |_, s| s.is_empty());
            }
            return Err(AuthenticateError::BoundToOtherUser { current: owner });
        }

        if sessions.contains(session_id) {
            return Ok(Authenticated {
                first_session_for_user: false,
                already_bound: true,
            });
        }

        // The socket may have closed while this call was in flight; unregister has
        // already run in that case and would never see this insert.
        if !self.connections.contains_key(session_id) {
            let empty = sessions.is_empty();
            drop(sessions);
            if empty {
                self.user_sessions.remove_if(&user_id, |_, s| s.is_empty());
            }
            return Err(AuthenticateError::UnknownSession(session_id.to_string()));
        }

        let first_session_for_user = sessions.is_empty();
        sessions.insert(session_id.to_string());

        tracing::debug!(
            session_id = %session_id,
            user_id = %user_id,
            first_session_for_user,
            "Session authenticated"
        );

        Ok(Authenticated {
            first_session_for_user,
            already_bound: false,
        })
    }

    /// Remove a session
    ///
    /// Returns `None` if the session was not registered.
    pub fn unregister(&self, session_id: &str) -> Option<Unregistered> {
        let (_, connection) = self.connections.remove(session_id)?;
        let user_id = connection.user_id();

        let last_session_for_user = match user_id {
            Some(user_id) => match self.user_sessions.entry(user_id) {
                Entry::Occupied(mut entry) => {
                    let removed = entry.get_mut().remove(session_id);
                    if entry.get().is_empty() {
                        entry.remove();
                        removed
                    } else {
                        false
                    }
                }
                Entry::Vacant(_) => false,
            },
            None => false,
        };

        tracing::debug!(
            session_id = %session_id,
            user_id = ?user_id,
            last_session_for_user,
            "Session unregistered"
        );

        Some(Unregistered {
            connection,
            user_id,
            last_session_for_user,
        })
    }

    /// Get a connection by session ID
    pub fn get(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| Arc::clone(r.value()))
    }

    /// Check if a session exists
    pub fn contains(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    /// A user is online while at least one of their sessions is registered
    pub fn is_online(&self, user_id: Snowflake) -> bool {
        self.user_sessions.contains_key(&user_id)
    }

    /// Get all connections for a user
    pub fn user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        let session_ids: Vec<String> = self
            .user_sessions
            .get(&user_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default();

        session_ids.iter().filter_map(|sid| self.get(sid)).collect()
    }

    /// Send a message to every registered session without waiting on any of them
    pub fn broadcast(&self, message: &GatewayMessage) -> usize {
        let connections: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .map(|r| Arc::clone(r.value()))
            .collect();

        let sent = connections
            .iter()
            .filter(|conn| conn.try_send(message.clone()))
            .count();

        tracing::debug!(event = %message.event, sent, "Message broadcast to all sessions");

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of unique authenticated users
    pub fn user_count(&self) -> usize {
        self.user_sessions.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("users", &self.user_sessions.len())
            .finish()
    }
}
