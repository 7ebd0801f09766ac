//! Repository traits (ports) - define the interface for data access
//!
//! The relay only needs four store operations; every one of them is fallible and
//! may take arbitrarily long, so callers bound them with a deadline.

use async_trait::async_trait;

use crate::entities::{Conversation, Message, NewMessage, UserProfile};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message; the store assigns `id` and `created_at` and stores it unread
    async fn create(&self, message: &NewMessage) -> RepoResult<Message>;
}

// ============================================================================
// Conversation Repository
// ============================================================================

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find conversation by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>>;

    /// Point the conversation at its newest message
    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()>;
}

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the public profile (name, avatar) of a user
    async fn find_profile(&self, id: Snowflake) -> RepoResult<Option<UserProfile>>;
}
