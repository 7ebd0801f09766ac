//! Event publisher port
//!
//! Services hand finished payloads to a publisher keyed by room; the gateway decides
//! which live sessions that reaches.

use serde_json::Value;

use crate::value_objects::RoomKey;

/// Fire-and-forget fan-out to a room
///
/// Delivery is at-most-once with no acknowledgement and no queueing for members that
/// are not connected. Implementations must not block on a slow member.
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` with `payload` to every member of `room`, returning how many
    /// sessions accepted it
    fn publish(&self, room: &RoomKey, event: &str, payload: &Value) -> usize;
}
