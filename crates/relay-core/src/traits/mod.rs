//! Ports - traits implemented by infrastructure

mod publisher;
mod repositories;

pub use publisher::EventPublisher;
pub use repositories::{ConversationRepository, MessageRepository, RepoResult, UserRepository};
