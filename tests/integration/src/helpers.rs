//! Test helpers for integration tests
//!
//! Provides a gateway server on an ephemeral port and a small WebSocket client that
//! speaks the `{event, data, ack}` frame format.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_common::AppConfig;
use relay_db::InMemoryStore;
use relay_gateway::{serve, GatewayState};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::seed_marketplace;

/// How long a client waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryStore>,
    pub state: GatewayState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the test configuration and a seeded store
    pub async fn start() -> Result<Self> {
        Self::start_with(&[]).await
    }

    /// Start a server with configuration overrides
    pub async fn start_with(overrides: &[(&str, &str)]) -> Result<Self> {
        let config = test_config(overrides)?;

        let store = Arc::new(InMemoryStore::new());
        seed_marketplace(&store);

        let state = GatewayState::with_memory_store(config, Arc::clone(&store))?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            serve(listener, server_state, async move {
                signal.await.ok();
            })
            .await
            .ok();
        });

        Ok(Self {
            addr,
            store,
            state,
            shutdown: Some(shutdown),
            handle,
        })
    }

    /// WebSocket URL of the gateway route
    pub fn ws_url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }

    /// Open a new client session
    pub async fn connect(&self) -> Result<TestClient> {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .context("WebSocket handshake failed")?;
        Ok(TestClient::new(stream))
    }

    /// Open a session and authenticate it
    pub async fn connect_as(&self, user_id: i64) -> Result<TestClient> {
        let mut client = self.connect().await?;
        client.authenticate(user_id).await?;
        Ok(client)
    }

    /// Open a session, authenticate it and join the test conversation
    pub async fn join_as(&self, user_id: i64, conversation_id: i64) -> Result<TestClient> {
        let mut client = self.connect_as(user_id).await?;
        client.join(conversation_id).await?;
        Ok(client)
    }

    /// Wait until the registry has `count` sessions
    pub async fn wait_for_connections(&self, count: usize) -> Result<()> {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.state.registry().connection_count() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| {
            anyhow!(
                "expected {count} sessions, have {}",
                self.state.registry().connection_count()
            )
        })
    }

    /// Stop the server and wait for it to finish
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        tokio::time::timeout(RECV_TIMEOUT, &mut self.handle)
            .await
            .context("server did not stop")??;
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}

/// Build a configuration for tests: ephemeral port, no database, short timers
pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let defaults = [
        ("GATEWAY_PORT", "0"),
        ("RELAY_TYPING_TIMEOUT_MS", "300"),
        ("RELAY_SWEEP_INTERVAL_MS", "50"),
        ("RELAY_STORE_TIMEOUT_MS", "500"),
    ];

    let lookup = |key: &str| {
        overrides
            .iter()
            .chain(defaults.iter())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    };

    AppConfig::from_source(lookup).map_err(|e| anyhow!("Config error: {e}"))
}

/// A decoded server frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub event: String,
    pub data: Value,
    pub ack: Option<u64>,
}

impl Frame {
    fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self {
            event: value["event"]
                .as_str()
                .ok_or_else(|| anyhow!("frame without event: {text}"))?
                .to_string(),
            data: value.get("data").cloned().unwrap_or(Value::Null),
            ack: value.get("ack").and_then(Value::as_u64),
        })
    }
}

/// WebSocket client for one session
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<Frame>,
    next_ack: u64,
}

impl TestClient {
    fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            stream,
            pending: VecDeque::new(),
            next_ack: 1,
        }
    }

    /// Send an event without an ack id
    pub async fn emit(&mut self, event: &str, data: Value) -> Result<()> {
        let frame = json!({ "event": event, "data": data });
        self.send_raw(Message::Text(frame.to_string())).await
    }

    /// Send an event with an ack id and wait for the ack reply
    ///
    /// Other events that arrive first are kept for later `expect_event` calls.
    pub async fn request(&mut self, event: &str, data: Value) -> Result<Value> {
        let ack = self.next_ack;
        self.next_ack += 1;

        let frame = json!({ "event": event, "data": data, "ack": ack });
        self.send_raw(Message::Text(frame.to_string())).await?;

        loop {
            let frame = self.read_frame().await?;
            if frame.event == "ack" && frame.ack == Some(ack) {
                return Ok(frame.data);
            }
            self.pending.push_back(frame);
        }
    }

    /// Send a raw WebSocket message
    pub async fn send_raw(&mut self, message: Message) -> Result<()> {
        self.stream.send(message).await?;
        Ok(())
    }

    /// Authenticate and wait for `authenticated`
    pub async fn authenticate(&mut self, user_id: i64) -> Result<Value> {
        self.emit("authenticate", json!(user_id.to_string())).await?;
        self.expect_event("authenticated").await
    }

    /// Join a conversation room and wait for `joined_conversation`
    pub async fn join(&mut self, conversation_id: i64) -> Result<Value> {
        self.emit(
            "join_conversation",
            json!({ "conversationId": conversation_id.to_string() }),
        )
        .await?;
        self.expect_event("joined_conversation").await
    }

    /// Next server frame, buffered ones first
    pub async fn next_frame(&mut self) -> Result<Frame> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        self.read_frame().await
    }

    /// Skip frames until one named `event` arrives and return its data
    pub async fn expect_event(&mut self, event: &str) -> Result<Value> {
        if let Some(pos) = self.pending.iter().position(|f| f.event == event) {
            let frame = self.pending.remove(pos).ok_or_else(|| anyhow!("lost frame"))?;
            return Ok(frame.data);
        }

        loop {
            let frame = self.read_frame().await?;
            if frame.event == event {
                return Ok(frame.data);
            }
        }
    }

    /// Fail if any frame named `event` arrives within `window`
    pub async fn expect_no_event(&mut self, event: &str, window: Duration) -> Result<()> {
        if let Some(frame) = self.pending.iter().find(|f| f.event == event) {
            bail!("unexpected {event}: {}", frame.data);
        }

        let deadline = tokio::time::Instant::now() + window;
        loop {
            match tokio::time::timeout_at(deadline, self.read_text()).await {
                Err(_) => return Ok(()),
                Ok(text) => {
                    let frame = Frame::parse(&text?)?;
                    if frame.event == event {
                        bail!("unexpected {event}: {}", frame.data);
                    }
                }
            }
        }
    }

    /// Discard every frame already buffered or arriving within `window`
    pub async fn drain(&mut self, window: Duration) {
        self.pending.clear();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Ok(_)) = tokio::time::timeout_at(deadline, self.read_text()).await {}
    }

    /// Wait for the server to close the session; returns the close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while let Some(message) = self.stream.next().await {
                match message? {
                    Message::Close(frame) => return Ok(frame.map(|f| u16::from(f.code))),
                    _ => continue,
                }
            }
            anyhow::Ok(None)
        })
        .await
        .context("timed out waiting for close")?
    }

    /// Close the session from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.read_text())
            .await
            .context("timed out waiting for a frame")??;
        Frame::parse(&text)
    }

    async fn read_text(&mut self) -> Result<String> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(text),
                Message::Close(frame) => bail!("session closed: {frame:?}"),
                _ => continue,
            }
        }
        bail!("stream ended")
    }
}
