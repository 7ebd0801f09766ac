//! Broadcast rooms
//!
//! `user:<id>` rooms are joined on authenticate, `conversation:<id>` rooms on
//! `join_conversation`. Closing a session is the only way to leave.

mod router;

pub use router::RoomRouter;
