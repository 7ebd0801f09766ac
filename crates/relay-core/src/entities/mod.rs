//! Domain entities - core business objects

mod conversation;
mod message;
mod user;

pub use conversation::Conversation;
pub use message::{Message, NewMessage};
pub use user::UserProfile;
