//! Connection management
//!
//! Tracks live WebSocket sessions and which user each one belongs to.

mod connection;
mod registry;

pub use connection::{Connection, Outbound};
pub use registry::{AuthenticateError, Authenticated, ConnectionRegistry, Unregistered};
