//! Room keys - names of broadcast groups
//!
//! Two families exist: a private channel per user (`user:<id>`) and a shared room per
//! conversation (`conversation:<id>`).

use std::fmt;

use crate::value_objects::Snowflake;

/// Prefix for per-user private rooms
pub const USER_ROOM_PREFIX: &str = "user:";
/// Prefix for per-conversation rooms
pub const CONVERSATION_ROOM_PREFIX: &str = "conversation:";

/// Typed name of a broadcast group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// Private notification channel of one user
    User(Snowflake),
    /// Shared room of one conversation
    Conversation(Snowflake),
}

impl RoomKey {
    /// Room for a user's private notifications
    #[must_use]
    pub const fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Room for a conversation
    #[must_use]
    pub const fn conversation(conversation_id: Snowflake) -> Self {
        Self::Conversation(conversation_id)
    }

    /// Parse `user:<id>` or `conversation:<id>`
    pub fn parse(s: &str) -> Result<Self, RoomKeyParseError> {
        if let Some(id) = s.strip_prefix(USER_ROOM_PREFIX) {
            Snowflake::parse(id)
                .map(Self::User)
                .map_err(|_| RoomKeyParseError::InvalidId(s.to_string()))
        } else if let Some(id) = s.strip_prefix(CONVERSATION_ROOM_PREFIX) {
            Snowflake::parse(id)
                .map(Self::Conversation)
                .map_err(|_| RoomKeyParseError::InvalidId(s.to_string()))
        } else {
            Err(RoomKeyParseError::UnknownFamily(s.to_string()))
        }
    }

    /// Whether this is a conversation room
    #[must_use]
    pub const fn is_conversation(&self) -> bool {
        matches!(self, Self::Conversation(_))
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{USER_ROOM_PREFIX}{id}"),
            Self::Conversation(id) => write!(f, "{CONVERSATION_ROOM_PREFIX}{id}"),
        }
    }
}

impl std::str::FromStr for RoomKey {
    type Err = RoomKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing a room key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomKeyParseError {
    #[error("unknown room family: {0}")]
    UnknownFamily(String),

    #[error("invalid id in room key: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_display() {
        assert_eq!(RoomKey::user(Snowflake::new(7)).to_string(), "user:7");
        assert_eq!(
            RoomKey::conversation(Snowflake::new(123)).to_string(),
            "conversation:123"
        );
    }

    #[test]
    fn test_room_key_parse() {
        assert_eq!(
            RoomKey::parse("user:7").unwrap(),
            RoomKey::User(Snowflake::new(7))
        );
        assert_eq!(
            "conversation:123".parse::<RoomKey>().unwrap(),
            RoomKey::Conversation(Snowflake::new(123))
        );
    }

    #[test]
    fn test_room_key_parse_errors() {
        assert!(matches!(
            RoomKey::parse("listing:1"),
            Err(RoomKeyParseError::UnknownFamily(_))
        ));
        assert!(matches!(
            RoomKey::parse("user:abc"),
            Err(RoomKeyParseError::InvalidId(_))
        ));
        assert!(matches!(
            RoomKey::parse("conversation:"),
            Err(RoomKeyParseError::InvalidId(_))
        ));
    }

    #[test]
    fn test_room_key_family() {
        assert!(RoomKey::conversation(Snowflake::new(1)).is_conversation());
        assert!(!RoomKey::user(Snowflake::new(1)).is_conversation());
    }
}
