//! Presence
//!
//! Online state is derived from the connection registry; this module owns the
//! lastSeen table and the `user_online_status` broadcasts.

mod tracker;

pub use tracker::PresenceTracker;
