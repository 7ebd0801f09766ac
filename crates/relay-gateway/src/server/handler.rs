//! WebSocket handler
//!
//! Each session runs three tasks: a reader that dispatches frames in arrival order, a
//! writer that drains the session's outbound queue, and a heartbeat that pings and
//! closes idle sessions.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::Instrument;

use crate::connection::{Connection, Outbound};
use crate::handlers::MessageDispatcher;
use crate::protocol::CloseCode;
use crate::server::GatewayState;

/// How long the writer may keep flushing after the session is torn down
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ended {
    Receive,
    Send,
    Heartbeat,
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let relay = &state.config().relay;
    let (tx, rx) = mpsc::channel::<Outbound>(relay.session_buffer);
    let heartbeat_interval = relay.heartbeat_interval();
    let heartbeat_timeout = relay.heartbeat_timeout();

    let connection = state.registry().register(tx);
    let span = tracing::info_span!("session", session_id = %connection.session_id());

    tracing::info!(parent: &span, "WebSocket connection established");

    let (ws_sink, ws_stream) = socket.split();

    let mut recv_task = tokio::spawn(
        receive_loop(state.clone(), Arc::clone(&connection), ws_stream).instrument(span.clone()),
    );
    let mut send_task = tokio::spawn(send_loop(rx, ws_sink).instrument(span.clone()));
    let mut heartbeat_task = tokio::spawn(
        heartbeat_loop(Arc::clone(&connection), heartbeat_interval, heartbeat_timeout)
            .instrument(span.clone()),
    );

    let ended = tokio::select! {
        _ = &mut recv_task => Ended::Receive,
        _ = &mut send_task => Ended::Send,
        _ = &mut heartbeat_task => Ended::Heartbeat,
    };
    tracing::debug!(parent: &span, ended = ?ended, "Session task ended");

    // Stop reading before teardown so no handler runs against a half-removed session
    if ended != Ended::Receive {
        recv_task.abort();
        let _ = recv_task.await;
    }
    if ended != Ended::Heartbeat {
        heartbeat_task.abort();
        let _ = heartbeat_task.await;
    }

    cleanup_connection(&state, &connection, &span);

    // The writer stops once the last sender is gone, after flushing any close frame
    drop(connection);
    if ended != Ended::Send
        && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task)
            .await
            .is_err()
    {
        send_task.abort();
    }
}

/// Read frames and dispatch them in order
async fn receive_loop(
    state: GatewayState,
    connection: Arc<Connection>,
    mut ws_stream: SplitStream<WebSocket>,
) {
    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                connection.touch();
                MessageDispatcher::dispatch_text(&state, &connection, &text).await;
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!("Binary frames not supported");
                connection.close(CloseCode::DecodeError);
                return;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                connection.touch();
            }
            Ok(Message::Close(_)) => {
                tracing::info!("Client closed connection");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket error");
                connection.close(CloseCode::UnknownError);
                return;
            }
        }
    }
}

/// Drain the outbound queue into the socket
async fn send_loop(mut rx: mpsc::Receiver<Outbound>, mut ws_sink: SplitSink<WebSocket, Message>) {
    while let Some(item) = rx.recv().await {
        let frame = match item {
            Outbound::Message(message) => match message.to_json() {
                Ok(json) => Message::Text(json.into()),
                Err(e) => {
                    tracing::warn!(error = %e, event = %message.event, "Failed to encode frame");
                    continue;
                }
            },
            Outbound::Ping => Message::Ping(Vec::new()),
            Outbound::Close(code) => {
                tracing::debug!(%code, "Closing session");
                let _ = ws_sink
                    .send(Message::Close(Some(CloseFrame {
                        code: code.as_u16(),
                        reason: code.description().into(),
                    })))
                    .await;
                return;
            }
        };

        if ws_sink.send(frame).await.is_err() {
            tracing::debug!("Failed to write to WebSocket");
            break;
        }
    }

    let _ = ws_sink.close().await;
}

/// Ping on every tick; close the session once it has been silent too long
async fn heartbeat_loop(connection: Arc<Connection>, period: Duration, timeout: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let idle = connection.idle_for();
        if idle > timeout {
            tracing::warn!(idle_ms = idle.as_millis(), "Session timed out");
            connection.close(CloseCode::SessionTimeout);
            return;
        }

        connection.ping();
    }
}

/// Remove a session from typing, rooms and the registry; announce offline if it was the last
fn cleanup_connection(state: &GatewayState, connection: &Connection, span: &tracing::Span) {
    state.typing().clear_session(connection.session_id());
    state.rooms().leave_all(connection);

    let Some(removed) = state.registry().unregister(connection.session_id()) else {
        return;
    };

    if let (Some(user_id), true) = (removed.user_id, removed.last_session_for_user) {
        state.presence().mark_offline(user_id);
    }

    tracing::info!(
        parent: span,
        user_id = ?removed.user_id,
        age_ms = connection.age().as_millis(),
        "WebSocket connection closed"
    );
}
