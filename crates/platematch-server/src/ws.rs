//! WebSocket connection handling.
//!
//! One task per connection. The task authenticates, registers the
//! connection with the coordinator, then multiplexes three things in a
//! single loop: outbound events queued by the coordinator, a periodic
//! liveness probe, and inbound client frames. Every exit path funnels
//! through the same disconnect cleanup so group state never leaks.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use platematch_core::ClientEvent;

use crate::state::AppState;

/// WebSocket close code 1008 (policy violation), sent when authentication
/// fails. The client must reconnect with a fresh token; there is no
/// in-band retry.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Connect-time parameters, supplied as query string on the upgrade
/// request: `/ws?token=...&group=ABC123`.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub token: Option<String>,
    /// Optional group to join immediately, as if the first frame had been
    /// an explicit join.
    #[serde(default)]
    pub group: Option<String>,
}

/// WebSocket upgrade handler for GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, params: ConnectParams) {
    let username = match state.verifier.verify_optional(params.token.as_deref()) {
        Ok(username) => username,
        Err(e) => {
            warn!(error = %e, "authentication failed - closing connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_POLICY_VIOLATION,
                    reason: "Authentication failed".into(),
                })))
                .await;
            return;
        }
    };

    let connection_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state
        .coordinator
        .connect(&connection_id, &username, tx, params.group.as_deref())
        .await;
    info!(connection_id = %connection_id, username = %username, "websocket connected");

    let (mut sender, mut receiver) = socket.split();

    let mut probe = tokio::time::interval(Duration::from_secs(state.config.ping_interval_secs));
    probe.tick().await; // the first tick completes immediately
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            // Outbound events queued by the coordinator
            Some(event) = rx.recv() => {
                if sender.send(Message::Text(event.to_json().into())).await.is_err() {
                    break;
                }
            }
            // Liveness probe: an unanswered ping for a full interval means
            // the peer is gone even if the socket never errored.
            _ = probe.tick() => {
                if awaiting_pong {
                    info!(username = %username, "liveness probe unanswered - reaping connection");
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }
            // Inbound client frames
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientEvent::parse(&text) {
                            Ok(event) => {
                                state.coordinator.handle_event(&connection_id, event).await;
                            }
                            Err(e) => {
                                // Non-fatal: drop the frame, keep the session.
                                warn!(username = %username, error = %e, "dropping malformed event");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(username = %username, error = %e, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    // Sole cleanup path: unregister and leave every joined group.
    state.coordinator.disconnect(&connection_id).await;
    debug!(connection_id = %connection_id, username = %username, "websocket closed");
}
