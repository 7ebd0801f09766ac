//! Gateway state
//!
//! Application state for the gateway server.

use std::sync::Arc;

use relay_common::{AppConfig, AppError};
use relay_core::{ConversationRepository, MessageRepository, UserRepository};
use relay_db::InMemoryStore;
use relay_service::{ServiceContext, ServiceContextBuilder};

use crate::connection::ConnectionRegistry;
use crate::presence::PresenceTracker;
use crate::rooms::RoomRouter;
use crate::typing::TypingStateTracker;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server. The room router doubles as
/// the message pipeline's event publisher.
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with repositories and the publisher
    service_context: Arc<ServiceContext>,
    /// Live sessions and user ownership
    registry: Arc<ConnectionRegistry>,
    presence: Arc<PresenceTracker>,
    rooms: Arc<RoomRouter>,
    typing: Arc<TypingStateTracker>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Wire the gateway components around the given store
    pub fn new(
        config: AppConfig,
        message_repo: Arc<dyn MessageRepository>,
        conversation_repo: Arc<dyn ConversationRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Result<Self, AppError> {
        let registry = ConnectionRegistry::new_shared();
        let rooms = Arc::new(RoomRouter::new(Arc::clone(&registry)));
        let presence = Arc::new(PresenceTracker::new(Arc::clone(&registry)));
        let typing = Arc::new(TypingStateTracker::new(
            Arc::clone(&rooms),
            config.relay.typing_timeout(),
        ));

        let service_context = ServiceContextBuilder::new()
            .message_repo(message_repo)
            .conversation_repo(conversation_repo)
            .user_repo(user_repo)
            .publisher(rooms.clone())
            .relay_config(&config.relay)
            .build()
            .map_err(AppError::internal)?;

        Ok(Self {
            service_context: Arc::new(service_context),
            registry,
            presence,
            rooms,
            typing,
            config: Arc::new(config),
        })
    }

    /// Gateway backed by an in-process store
    pub fn with_memory_store(config: AppConfig, store: Arc<InMemoryStore>) -> Result<Self, AppError> {
        Self::new(config, store.clone(), store.clone(), store)
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get the presence tracker
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Get the room router
    pub fn rooms(&self) -> &RoomRouter {
        &self.rooms
    }

    /// Get the typing tracker
    pub fn typing(&self) -> &TypingStateTracker {
        &self.typing
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("rooms", &self.rooms)
            .field("typing", &self.typing)
            .field("config", &"AppConfig")
            .finish()
    }
}
