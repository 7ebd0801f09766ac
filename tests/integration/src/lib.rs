//! Integration test utilities for the relay gateway
//!
//! This crate provides helpers for running end-to-end tests against a gateway
//! spawned on an ephemeral port with an in-memory store.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
