//! Data Transfer Objects
//!
//! Request DTOs are deserialized from event payloads and validated; response DTOs are
//! serialized with camelCase keys. Snowflake ids travel as strings.

mod requests;
mod responses;

pub use requests::{describe_validation_errors, SendMessageRequest};
pub use responses::{ErrorBody, MessageResponse, NotificationPayload, SenderPayload};
