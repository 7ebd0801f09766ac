//! Typing indicators
//!
//! Entries live only in memory and expire on their own; a client that disconnects
//! mid-sentence still produces a `hide_typing`.

mod tracker;

pub use tracker::TypingStateTracker;
