//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in relay-core.

mod conversation;
mod error;
mod message;
mod user;

pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use user::PgUserRepository;
