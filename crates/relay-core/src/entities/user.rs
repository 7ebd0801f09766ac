//! User profile - the denormalized identity attached to outgoing messages

use crate::value_objects::Snowflake;

/// Display name used when a sender cannot be looked up
pub const UNKNOWN_USER_NAME: &str = "Unknown";

/// Public profile of a marketplace user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Snowflake,
    pub name: String,
    /// Profile picture URL
    pub avatar: Option<String>,
}

impl UserProfile {
    /// Create a profile
    pub fn new(id: Snowflake, name: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar,
        }
    }

    /// Stand-in identity for a sender whose profile is unavailable
    pub fn placeholder(id: Snowflake) -> Self {
        Self {
            id,
            name: UNKNOWN_USER_NAME.to_string(),
            avatar: None,
        }
    }

    /// Whether this is the stand-in identity
    pub fn is_placeholder(&self) -> bool {
        self.name == UNKNOWN_USER_NAME && self.avatar.is_none()
    }
}
