//! Gateway protocol definitions
//!
//! Frame format, event names, payload shapes and close codes.

mod close_codes;
mod events;
mod messages;
mod payloads;

pub use close_codes::CloseCode;
pub use events::{ClientEvent, PayloadError, ServerEvent};
pub use messages::{encode_payload, FrameError, GatewayMessage};
pub use payloads::{
    AuthenticatedPayload, JoinConversationPayload, JoinedConversationPayload, PresencePayload,
    TypingPayload, UserStatusPayload,
};
