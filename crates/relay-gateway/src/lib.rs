//! # relay-gateway
//!
//! WebSocket gateway for the marketplace chat relay: session registry, presence,
//! rooms, typing indicators and the event dispatcher in front of the message pipeline.

pub mod connection;
pub mod handlers;
pub mod presence;
pub mod protocol;
pub mod rooms;
pub mod server;
pub mod typing;

pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
