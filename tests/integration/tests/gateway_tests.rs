//! Gateway Integration Tests
//!
//! Each test spawns a gateway on an ephemeral port with a seeded in-memory store and
//! drives it over real WebSocket sessions.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use integration_tests::{
    message_payload, typing_payload, TestClient, TestServer, ALICE, BOB, CAROL, CONVERSATION,
};
use relay_core::Snowflake;
use relay_db::StoreOperation;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;

const QUIET: Duration = Duration::from_millis(200);

/// Wait for the `user_online_status` event about `user_id`
async fn status_of(client: &mut TestClient, user_id: i64) -> Value {
    loop {
        let data = client.expect_event("user_online_status").await.unwrap();
        if data["userId"] == user_id.to_string() {
            return data;
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("OK"), "{response}");
}

// ============================================================================
// Message pipeline
// ============================================================================

#[tokio::test]
async fn test_send_hello_reaches_room_and_receiver() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "hello"))
        .await
        .unwrap();

    assert_eq!(ack["success"], true);
    let data = &ack["data"];
    assert_eq!(data["conversationId"], CONVERSATION.to_string());
    assert_eq!(data["receiverId"], BOB.to_string());
    assert_eq!(data["sender"]["id"], ALICE.to_string());
    assert_eq!(data["sender"]["name"], "Alice");
    assert_eq!(data["isRead"], false);
    assert!(data["id"].is_string());
    assert!(data["createdAt"].is_string());

    let messages = server.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, Snowflake::new(ALICE));
    assert_eq!(messages[0].receiver_id, Snowflake::new(BOB));
    assert_eq!(messages[0].content, "hello");
    assert!(!messages[0].is_read);

    let echoed = a1.expect_event("receive_message").await.unwrap();
    assert_eq!(echoed["id"], data["id"]);

    let received = b1.expect_event("receive_message").await.unwrap();
    assert_eq!(received["sender"]["name"], "Alice");
    assert_eq!(received["content"], "hello");

    let note = b1.expect_event("new_message_notification").await.unwrap();
    assert_eq!(note["conversationId"], CONVERSATION.to_string());
    assert_eq!(note["senderId"], ALICE.to_string());
    assert_eq!(note["senderName"], "Alice");
    assert_eq!(note["content"], "hello");
    assert_eq!(note["messageId"], data["id"]);

    a1.expect_no_event("new_message_notification", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_echo_reaches_senders_other_sessions() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut a2 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let _b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "synced"))
        .await
        .unwrap();
    assert_eq!(ack["success"], true);

    let echoed = a2.expect_event("receive_message").await.unwrap();
    assert_eq!(echoed["content"], "synced");
    assert_eq!(echoed["id"], ack["data"]["id"]);
}

#[tokio::test]
async fn test_notification_reaches_receiver_outside_room() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.connect_as(BOB).await.unwrap();

    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "ping"))
        .await
        .unwrap();
    assert_eq!(ack["success"], true);

    let note = b1.expect_event("new_message_notification").await.unwrap();
    assert_eq!(note["content"], "ping");
    b1.expect_no_event("receive_message", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_ordering_by_store_id() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    let first = a1
        .request("send_message", message_payload(ALICE, BOB, "one"))
        .await
        .unwrap();
    let second = b1
        .request("send_message", message_payload(BOB, ALICE, "two"))
        .await
        .unwrap();

    let first_id: i64 = first["data"]["id"].as_str().unwrap().parse().unwrap();
    let second_id: i64 = second["data"]["id"].as_str().unwrap().parse().unwrap();
    assert!(first_id < second_id);

    tokio::time::sleep(QUIET).await;
    let conversation = server.store.conversation(Snowflake::new(CONVERSATION)).unwrap();
    assert_eq!(conversation.last_message_id, Some(Snowflake::new(second_id)));
}

#[tokio::test]
async fn test_unauthorized_send_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    let ack = a1
        .request("send_message", message_payload(ALICE, CAROL, "psst"))
        .await
        .unwrap();

    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "authorize");
    assert_eq!(ack["error"]["code"], "AUTHORIZATION_ERROR");
    assert_eq!(ack["error"]["retriable"], false);
    assert_eq!(server.store.message_count(), 0);

    b1.expect_no_event("receive_message", QUIET).await.unwrap();
    a1.expect_no_event("receive_message", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_send_as_other_user_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    let ack = b1
        .request("send_message", message_payload(ALICE, BOB, "forged"))
        .await
        .unwrap();

    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "authorize");
    assert_eq!(server.store.message_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_fail_validation() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();

    let ack = a1
        .request(
            "send_message",
            json!({ "conversationId": CONVERSATION.to_string(), "senderId": ALICE.to_string() }),
        )
        .await
        .unwrap();

    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "validate");
    assert_eq!(ack["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(server.store.message_count(), 0);
}

#[tokio::test]
async fn test_store_failure_is_reported_and_retriable() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    server.store.fail(StoreOperation::CreateMessage);
    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "lost"))
        .await
        .unwrap();

    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "persist");
    assert_eq!(ack["error"]["code"], "PERSISTENCE_ERROR");
    assert_eq!(ack["error"]["retriable"], true);
    b1.expect_no_event("receive_message", QUIET).await.unwrap();

    server.store.heal(StoreOperation::CreateMessage);
    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "retry"))
        .await
        .unwrap();
    assert_eq!(ack["success"], true);
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();

    server
        .store
        .delay(StoreOperation::CreateMessage, Duration::from_secs(2));
    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "slow"))
        .await
        .unwrap();

    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["code"], "STORE_TIMEOUT");
    assert_eq!(ack["error"]["retriable"], true);
}

#[tokio::test]
async fn test_sender_timed_out_mid_send_still_delivers() {
    let server = TestServer::start_with(&[
        ("RELAY_HEARTBEAT_INTERVAL_MS", "100"),
        ("RELAY_HEARTBEAT_TIMEOUT_MS", "250"),
        ("RELAY_STORE_TIMEOUT_MS", "3000"),
    ])
    .await
    .expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    server
        .store
        .delay(StoreOperation::FindProfile, Duration::from_secs(1));
    a1.emit("send_message", message_payload(ALICE, BOB, "still there?"))
        .await
        .unwrap();

    // Alice stops reading, so her session is closed while the profile lookup runs
    let message = b1.expect_event("receive_message").await.unwrap();
    assert_eq!(message["content"], "still there?");
    assert_eq!(message["sender"]["name"], "Alice");

    let note = b1.expect_event("new_message_notification").await.unwrap();
    assert_eq!(note["messageId"], message["id"]);

    assert_eq!(a1.expect_close().await.unwrap(), Some(4009));
    assert_eq!(server.store.message_count(), 1);
}

#[tokio::test]
async fn test_enrichment_failure_uses_placeholder() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    server.store.fail(StoreOperation::FindProfile);
    let ack = a1
        .request("send_message", message_payload(ALICE, BOB, "anon"))
        .await
        .unwrap();

    assert_eq!(ack["success"], true);
    assert_eq!(ack["data"]["sender"]["name"], "Unknown");
    assert!(ack["data"]["sender"]["avatar"].is_null());

    let note = b1.expect_event("new_message_notification").await.unwrap();
    assert_eq!(note["senderName"], "Unknown");
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_offline_broadcast_fires_once() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut watcher = server.connect_as(CAROL).await.unwrap();

    let a1 = server.connect_as(ALICE).await.unwrap();
    let online = status_of(&mut watcher, ALICE).await;
    assert_eq!(online["isOnline"], true);

    let a2 = server.connect_as(ALICE).await.unwrap();
    watcher.expect_no_event("user_online_status", QUIET).await.unwrap();

    a1.close().await.unwrap();
    server.wait_for_connections(2).await.unwrap();
    watcher.expect_no_event("user_online_status", QUIET).await.unwrap();

    a2.close().await.unwrap();
    let offline = status_of(&mut watcher, ALICE).await;
    assert_eq!(offline["isOnline"], false);
    assert!(offline["lastSeen"].is_string());

    watcher.expect_no_event("user_online_status", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_status_queries() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut c1 = server.connect_as(CAROL).await.unwrap();

    let status = c1.request("check_user_status", json!(BOB.to_string())).await.unwrap();
    assert_eq!(status["isOnline"], false);
    assert!(status["lastSeen"].is_null());

    let b1 = server.connect_as(BOB).await.unwrap();
    let status = c1.request("check_user_status", json!(BOB)).await.unwrap();
    assert_eq!(status["isOnline"], true);

    b1.close().await.unwrap();
    server.wait_for_connections(1).await.unwrap();

    let status = c1.request("check_user_status", json!(BOB)).await.unwrap();
    assert_eq!(status["isOnline"], false);
    assert!(status["lastSeen"].is_string());

    let users = c1.request("get_online_users", Value::Null).await.unwrap();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let bob = users.iter().find(|u| u["userId"] == BOB.to_string()).unwrap();
    assert_eq!(bob["isOnline"], false);
    let carol = users.iter().find(|u| u["userId"] == CAROL.to_string()).unwrap();
    assert_eq!(carol["isOnline"], true);
}

#[tokio::test]
async fn test_reauthenticate_as_other_user_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.connect_as(ALICE).await.unwrap();

    let ack = a1.request("authenticate", json!(BOB.to_string())).await.unwrap();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "authorize");

    let ack = a1.request("authenticate", json!(ALICE.to_string())).await.unwrap();
    assert_eq!(ack["success"], true);
    assert!(!server.state.registry().is_online(Snowflake::new(BOB)));
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_expires_without_stop() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    a1.emit("typing", typing_payload(ALICE)).await.unwrap();

    let shown = b1.expect_event("display_typing").await.unwrap();
    assert_eq!(shown["userId"], ALICE.to_string());
    assert_eq!(shown["conversationId"], CONVERSATION.to_string());

    let hidden = b1.expect_event("hide_typing").await.unwrap();
    assert_eq!(hidden["userId"], ALICE.to_string());

    a1.expect_no_event("display_typing", QUIET).await.unwrap();
    a1.expect_no_event("hide_typing", QUIET).await.unwrap();
}

#[tokio::test]
async fn test_stop_typing_relays_hide() {
    let server = TestServer::start_with(&[("RELAY_TYPING_TIMEOUT_MS", "10000")])
        .await
        .expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    a1.emit("typing", typing_payload(ALICE)).await.unwrap();
    b1.expect_event("display_typing").await.unwrap();

    a1.emit("stop_typing", typing_payload(ALICE)).await.unwrap();
    b1.expect_event("hide_typing").await.unwrap();
    assert!(server.state.typing().is_empty());
}

#[tokio::test]
async fn test_disconnect_clears_typing() {
    let server = TestServer::start_with(&[("RELAY_TYPING_TIMEOUT_MS", "10000")])
        .await
        .expect("Failed to start server");
    let mut a1 = server.join_as(ALICE, CONVERSATION).await.unwrap();
    let mut b1 = server.join_as(BOB, CONVERSATION).await.unwrap();

    a1.emit("typing", typing_payload(ALICE)).await.unwrap();
    b1.expect_event("display_typing").await.unwrap();

    a1.close().await.unwrap();
    let hidden = b1.expect_event("hide_typing").await.unwrap();
    assert_eq!(hidden["userId"], ALICE.to_string());
}

// ============================================================================
// Protocol errors and transport
// ============================================================================

#[tokio::test]
async fn test_malformed_frames_keep_session_open() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client
        .send_raw(Message::Text("{not json".to_string()))
        .await
        .unwrap();
    let error = client.expect_event("error").await.unwrap();
    assert_eq!(error["stage"], "validate");
    assert_eq!(error["code"], "VALIDATION_ERROR");

    let ack = client
        .request("join_conversation", json!(CONVERSATION.to_string()))
        .await
        .unwrap();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"]["stage"], "validate");

    client.emit("launch_rockets", Value::Null).await.unwrap();
    client.expect_event("error").await.unwrap();

    let authenticated = client.authenticate(ALICE).await.unwrap();
    assert_eq!(authenticated["success"], true);
}

#[tokio::test]
async fn test_binary_frame_closes_with_decode_error() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect_as(ALICE).await.unwrap();

    client.send_raw(Message::Binary(vec![1, 2, 3])).await.unwrap();

    assert_eq!(client.expect_close().await.unwrap(), Some(4002));
    server.wait_for_connections(0).await.unwrap();
    assert!(!server.state.registry().is_online(Snowflake::new(ALICE)));
}

#[tokio::test]
async fn test_silent_session_times_out() {
    let server = TestServer::start_with(&[
        ("RELAY_HEARTBEAT_INTERVAL_MS", "100"),
        ("RELAY_HEARTBEAT_TIMEOUT_MS", "250"),
    ])
    .await
    .expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    // Not reading means no pongs go back
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(client.expect_close().await.unwrap(), Some(4009));
    server.wait_for_connections(0).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.connect_as(ALICE).await.unwrap();
    client.close().await.unwrap();
    server.wait_for_connections(0).await.unwrap();

    server.shutdown().await.unwrap();
}
