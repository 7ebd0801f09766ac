//! Request DTOs for gateway events

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

/// `send_message` payload
///
/// Missing fields deserialize to empty strings so that absence and emptiness are
/// reported the same way, by validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SendMessageRequest {
    #[serde(deserialize_with = "id_string")]
    #[validate(length(min = 1, message = "conversationId is required"))]
    pub conversation_id: String,

    #[serde(deserialize_with = "id_string")]
    #[validate(length(min = 1, message = "senderId is required"))]
    pub sender_id: String,

    #[serde(deserialize_with = "id_string")]
    #[validate(length(min = 1, message = "receiverId is required"))]
    pub receiver_id: String,

    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

impl SendMessageRequest {
    pub fn new(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
        }
    }
}

/// Accept ids as JSON strings or integers, keeping the textual form for validation
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
        Missing(()),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
        RawId::Missing(()) => String::new(),
    })
}

/// Flatten validator output into one stable, human-readable line
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
