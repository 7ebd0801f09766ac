//! Test fixtures and data generators
//!
//! A small marketplace: Alice sells, Bob buys, Carol is unrelated to their conversation.

use relay_core::{Conversation, Snowflake, UserProfile};
use relay_db::InMemoryStore;
use serde_json::{json, Value};

pub const ALICE: i64 = 1001;
pub const BOB: i64 = 1002;
pub const CAROL: i64 = 1003;

pub const LISTING: i64 = 5001;
pub const CONVERSATION: i64 = 123;

/// Insert the three users and the Alice/Bob conversation
pub fn seed_marketplace(store: &InMemoryStore) {
    store.insert_user(UserProfile::new(
        Snowflake::new(ALICE),
        "Alice",
        Some("https://cdn.example/alice.png".to_string()),
    ));
    store.insert_user(UserProfile::new(Snowflake::new(BOB), "Bob", None));
    store.insert_user(UserProfile::new(Snowflake::new(CAROL), "Carol", None));
    store.insert_conversation(Conversation::new(
        Snowflake::new(CONVERSATION),
        Snowflake::new(LISTING),
        vec![Snowflake::new(ALICE), Snowflake::new(BOB)],
    ));
}

/// `send_message` payload with string ids, as browsers send them
pub fn message_payload(sender: i64, receiver: i64, content: &str) -> Value {
    json!({
        "conversationId": CONVERSATION.to_string(),
        "senderId": sender.to_string(),
        "receiverId": receiver.to_string(),
        "content": content,
    })
}

/// `typing` / `stop_typing` payload
pub fn typing_payload(user: i64) -> Value {
    json!({
        "conversationId": CONVERSATION.to_string(),
        "userId": user.to_string(),
    })
}
