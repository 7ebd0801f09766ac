//! In-memory store
//!
//! One struct implementing every repository port, backed by `parking_lot` locks.
//! Used by the test suites and by local runs without `DATABASE_URL`. Individual
//! operations can be made to fail or stall to exercise the pipeline's error paths.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::instrument;

use relay_core::entities::{Conversation, Message, NewMessage, UserProfile};
use relay_core::error::DomainError;
use relay_core::traits::{ConversationRepository, MessageRepository, RepoResult, UserRepository};
use relay_core::value_objects::{Snowflake, SnowflakeGenerator};

/// Store operations that can be faulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CreateMessage,
    FindConversation,
    UpdateLastMessage,
    FindProfile,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Fail,
    Delay(Duration),
}

/// In-process implementation of the message, conversation and user repositories
pub struct InMemoryStore {
    ids: SnowflakeGenerator,
    messages: RwLock<Vec<Message>>,
    conversations: RwLock<HashMap<Snowflake, Conversation>>,
    users: RwLock<HashMap<Snowflake, UserProfile>>,
    faults: Mutex<HashMap<StoreOperation, Fault>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_worker(0)
    }

    /// Create an empty store whose message ids carry `worker_id`
    pub fn with_worker(worker_id: u16) -> Self {
        Self {
            ids: SnowflakeGenerator::new(worker_id),
            messages: RwLock::new(Vec::new()),
            conversations: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            faults: Mutex::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Seeding and inspection
    // ========================================================================

    pub fn insert_user(&self, profile: UserProfile) {
        self.users.write().insert(profile.id, profile);
    }

    pub fn insert_conversation(&self, conversation: Conversation) {
        self.conversations.write().insert(conversation.id, conversation);
    }

    /// Snapshot of a stored conversation
    pub fn conversation(&self, id: Snowflake) -> Option<Conversation> {
        self.conversations.read().get(&id).cloned()
    }

    /// Snapshot of every stored message in insertion order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    // ========================================================================
    // Fault injection
    // ========================================================================

    /// Make every call to `op` fail with a database error
    pub fn fail(&self, op: StoreOperation) {
        self.faults.lock().insert(op, Fault::Fail);
    }

    /// Make every call to `op` wait `delay` before running
    pub fn delay(&self, op: StoreOperation, delay: Duration) {
        self.faults.lock().insert(op, Fault::Delay(delay));
    }

    /// Clear any fault on `op`
    pub fn heal(&self, op: StoreOperation) {
        self.faults.lock().remove(&op);
    }

    async fn apply_fault(&self, op: StoreOperation) -> RepoResult<()> {
        let fault = self.faults.lock().get(&op).copied();
        match fault {
            Some(Fault::Fail) => Err(DomainError::DatabaseError(format!(
                "injected failure on {op:?}"
            ))),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    #[instrument(skip(self, message))]
    async fn create(&self, message: &NewMessage) -> RepoResult<Message> {
        self.apply_fault(StoreOperation::CreateMessage).await?;

        let stored = Message::from_new(message.clone(), self.ids.generate(), Utc::now());
        self.messages.write().push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl ConversationRepository for InMemoryStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        self.apply_fault(StoreOperation::FindConversation).await?;
        Ok(self.conversation(id))
    }

    #[instrument(skip(self))]
    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()> {
        self.apply_fault(StoreOperation::UpdateLastMessage).await?;

        let mut conversations = self.conversations.write();
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;

        if conversation.last_message_id.is_none_or(|last| last < message_id) {
            conversation.set_last_message(message_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    #[instrument(skip(self))]
    async fn find_profile(&self, id: Snowflake) -> RepoResult<Option<UserProfile>> {
        self.apply_fault(StoreOperation::FindProfile).await?;
        Ok(self.users.read().get(&id).cloned())
    }
}
