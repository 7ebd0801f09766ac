//! Service context - dependency container for services
//!
//! Holds the store ports, the event publisher and the pipeline limits.

use std::sync::Arc;
use std::time::Duration;

use relay_common::RelayConfig;
use relay_core::traits::{
    ConversationRepository, EventPublisher, MessageRepository, UserRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    message_repo: Arc<dyn MessageRepository>,
    conversation_repo: Arc<dyn ConversationRepository>,
    user_repo: Arc<dyn UserRepository>,

    // Fan-out
    publisher: Arc<dyn EventPublisher>,

    // Limits
    store_timeout: Duration,
    max_content_length: usize,
}

impl ServiceContext {
    // === Repositories ===

    /// Get the message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Get the conversation repository
    pub fn conversation_repo(&self) -> &dyn ConversationRepository {
        self.conversation_repo.as_ref()
    }

    /// Shared handle to the conversation repository, for work that outlives the call
    pub fn conversation_repo_handle(&self) -> Arc<dyn ConversationRepository> {
        Arc::clone(&self.conversation_repo)
    }

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    // === Fan-out ===

    /// Get the event publisher
    pub fn publisher(&self) -> &dyn EventPublisher {
        self.publisher.as_ref()
    }

    // === Limits ===

    /// Deadline applied to every store call
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Maximum message length in characters
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("publisher", &"...")
            .field("store_timeout", &self.store_timeout)
            .field("max_content_length", &self.max_content_length)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    message_repo: Option<Arc<dyn MessageRepository>>,
    conversation_repo: Option<Arc<dyn ConversationRepository>>,
    user_repo: Option<Arc<dyn UserRepository>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    store_timeout: Duration,
    max_content_length: usize,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        let defaults = RelayConfig::default();
        Self {
            message_repo: None,
            conversation_repo: None,
            user_repo: None,
            publisher: None,
            store_timeout: defaults.store_timeout(),
            max_content_length: defaults.max_content_length,
        }
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn conversation_repo(mut self, repo: Arc<dyn ConversationRepository>) -> Self {
        self.conversation_repo = Some(repo);
        self
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn max_content_length(mut self, max: usize) -> Self {
        self.max_content_length = max;
        self
    }

    /// Take the pipeline limits from relay configuration
    pub fn relay_config(self, config: &RelayConfig) -> Self {
        self.store_timeout(config.store_timeout())
            .max_content_length(config.max_content_length)
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns error if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            message_repo: self
                .message_repo
                .ok_or_else(|| ServiceError::internal("message_repo is required"))?,
            conversation_repo: self
                .conversation_repo
                .ok_or_else(|| ServiceError::internal("conversation_repo is required"))?,
            user_repo: self
                .user_repo
                .ok_or_else(|| ServiceError::internal("user_repo is required"))?,
            publisher: self
                .publisher
                .ok_or_else(|| ServiceError::internal("publisher is required"))?,
            store_timeout: self.store_timeout,
            max_content_length: self.max_content_length,
        })
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
