//! # relay-core
//!
//! Domain layer for the marketplace chat relay: entities, value objects, store ports and
//! the publisher port used to fan events out to rooms.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Conversation, Message, NewMessage, UserProfile};
pub use error::DomainError;
pub use traits::{
    ConversationRepository, EventPublisher, MessageRepository, RepoResult, UserRepository,
};
pub use value_objects::{RoomKey, RoomKeyParseError, Snowflake, SnowflakeGenerator, SnowflakeParseError};
