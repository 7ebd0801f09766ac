//! Gateway message format
//!
//! Every WebSocket text frame in either direction is one JSON object:
//! `{"event": "<name>", "data": <any>, "ack": <u64>}` where `data` and `ack` are optional.

use serde::{Deserialize, Serialize};
use tracing::warn;
use serde_json::Value;

use super::ServerEvent;

/// Gateway message format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Event name
    pub event: String,

    /// Event payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Acknowledgement id; a client frame carrying one expects exactly one `ack` reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

/// A text frame that could not be read as a `GatewayMessage`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame: {reason}")]
pub struct FrameError {
    /// Ack id recovered from the frame, if it had one
    pub ack: Option<u64>,
    pub reason: String,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create an event message
    #[must_use]
    pub fn event(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data: Some(data),
            ack: None,
        }
    }

    /// Create a typed server event
    #[must_use]
    pub fn server(event: ServerEvent, data: Value) -> Self {
        Self::event(event.as_str(), data)
    }

    /// Create the reply to a client frame that carried `ack`
    #[must_use]
    pub fn ack_reply(ack: u64, data: Value) -> Self {
        Self {
            event: ServerEvent::Ack.as_str().to_string(),
            data: Some(data),
            ack: Some(ack),
        }
    }

    // === Parsing Client Messages ===

    /// Parse a client frame
    ///
    /// The ack id is recovered even when the rest of the frame is malformed so that
    /// the error can be routed back to the waiting callback.
    pub fn from_json(json: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(json).map_err(|e| FrameError {
            ack: None,
            reason: e.to_string(),
        })?;

        let ack = value.get("ack").and_then(Value::as_u64);

        serde_json::from_value(value).map_err(|e| FrameError {
            ack,
            reason: e.to_string(),
        })
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Payload or JSON null
    pub fn data_or_null(&self) -> Value {
        self.data.clone().unwrap_or(Value::Null)
    }
}

/// Encode an outbound payload for `event`, logging when it has no JSON form
pub fn encode_payload<T: Serialize>(event: &str, payload: &T) -> Result<Value, serde_json::Error> {
    match serde_json::to_value(payload) {
        Ok(data) => Ok(data),
        Err(e) => {
            warn!(event, error = %e, "Failed to encode payload");
            Err(e)
        }
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ack {
            Some(ack) => write!(f, "GatewayMessage(event={}, ack={ack})", self.event),
            None => write!(f, "GatewayMessage(event={})", self.event),
        }
    }
}
