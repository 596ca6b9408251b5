//! Per-connection state machine: Unauthenticated -> Authenticated -> Closed.
//!
//! Grounded on the teacher's `websocket/connection.rs::handle_socket`: split
//! the socket, give the writer half its own task fed by an mpsc channel, and
//! race an auth deadline against the first inbound frame. Ludo has no
//! message-batching mode to carry over — every outbound frame is sent as
//! soon as it is produced.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::protocol::{validation, ClientMessage, GameCode, PlayerNameRulesPayload, ServerMessage};
use crate::room::{JoinError, RoomHandle};

use super::routes::AppState;

const AUTH_FAILURE_CLOSE: u16 = 4001;
const INTERNAL_ERROR_CLOSE: u16 = 1011;
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, code: GameCode, addr: SocketAddr) {
    let (ws_tx, mut ws_rx) = socket.split();

    let Some((room, user_id, out_tx, send_task)) = authenticate(ws_tx, &mut ws_rx, &state, &code, addr).await else {
        return;
    };

    read_loop(&mut ws_rx, &room, &user_id, &state).await;

    room.leave(user_id).await;
    drop(out_tx);
    let _ = send_task.await;
}

type SendTask = tokio::task::JoinHandle<()>;

/// Runs the Unauthenticated phase to completion, consuming the write half of
/// the socket either to reject the connection directly or to hand it off to
/// the writer task. Returns `None` once the socket has already been closed.
async fn authenticate(
    mut ws_tx: SplitSink<WebSocket, Message>,
    ws_rx: &mut SplitStream<WebSocket>,
    state: &Arc<AppState>,
    code: &GameCode,
    addr: SocketAddr,
) -> Option<(RoomHandle, String, mpsc::Sender<Arc<ServerMessage>>, SendTask)> {
    let auth_timeout = Duration::from_secs(state.config.websocket.auth_timeout_secs);
    let first_frame = tokio::time::timeout(auth_timeout, ws_rx.next()).await;

    let raw = match first_frame {
        Ok(Some(Ok(Message::Text(raw)))) => raw,
        _ => {
            reject(ws_tx, AUTH_FAILURE_CLOSE, Some("authentication timed out")).await;
            return None;
        }
    };

    let token = match serde_json::from_str::<ClientMessage>(&raw) {
        Ok(ClientMessage::Auth { token }) => token,
        _ => {
            reject(ws_tx, AUTH_FAILURE_CLOSE, Some("first message must be AUTH")).await;
            return None;
        }
    };

    let identity_timeout = Duration::from_secs(state.config.auth.identity_timeout_secs);
    let resolved = match tokio::time::timeout(identity_timeout, state.ports.identity.resolve(&token)).await {
        Ok(Ok(resolved)) => resolved,
        _ => {
            reject(ws_tx, AUTH_FAILURE_CLOSE, Some("invalid or expired token")).await;
            return None;
        }
    };

    if state.rate_limiter.check_join_attempt(&addr.ip().to_string()).await.is_err() {
        state.metrics.increment_rate_limit_rejections();
        reject(ws_tx, AUTH_FAILURE_CLOSE, Some("too many join attempts, try again shortly")).await;
        return None;
    }

    let room = match state.registry.get_or_create_room(code, &resolved.user_id).await {
        Ok(room) => room,
        Err(crate::registry::RegistryError::LookupFailed) => {
            state.metrics.increment_connection_errors();
            reject(ws_tx, INTERNAL_ERROR_CLOSE, None).await;
            return None;
        }
        Err(crate::registry::RegistryError::RoomNotFound) => {
            reject(ws_tx, AUTH_FAILURE_CLOSE, Some("no such room")).await;
            return None;
        }
        Err(crate::registry::RegistryError::TournamentCompleted) => {
            reject(ws_tx, INTERNAL_ERROR_CLOSE, Some("this tournament has already completed")).await;
            return None;
        }
    };

    if let Err(reason) = validation::validate_player_name_with_config(&resolved.display_name, &state.config.protocol) {
        reject(ws_tx, AUTH_FAILURE_CLOSE, Some(&reason)).await;
        return None;
    }

    let (out_tx, out_rx) = mpsc::channel::<Arc<ServerMessage>>(OUTBOUND_QUEUE_CAPACITY);

    if let Err(join_error) = room.join(resolved.user_id.clone(), resolved.display_name.clone(), out_tx.clone()).await {
        let message = match join_error {
            JoinError::RoomFull => "room is full",
            JoinError::InvalidRoomState => "game already in progress",
            JoinError::NameTaken => "player name already taken in this room",
        };
        reject(ws_tx, AUTH_FAILURE_CLOSE, Some(message)).await;
        return None;
    }

    let send_task = spawn_writer(ws_tx, out_rx);

    let _ = out_tx
        .send(Arc::new(ServerMessage::AuthSuccess {
            player_name_rules: Some(PlayerNameRulesPayload::from_protocol_config(&state.config.protocol)),
        }))
        .await;

    Some((room, resolved.user_id, out_tx, send_task))
}

/// Takes ownership of the sink so the read loop never blocks on writes.
fn spawn_writer(mut sink: SplitSink<WebSocket, Message>, mut out_rx: mpsc::Receiver<Arc<ServerMessage>>) -> SendTask {
    tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(message.as_ref()) else {
                continue;
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    })
}

async fn read_loop(ws_rx: &mut SplitStream<WebSocket>, room: &RoomHandle, user_id: &str, state: &Arc<AppState>) {
    let max_size = state.config.websocket.max_message_size;
    while let Some(frame) = ws_rx.next().await {
        let Ok(frame) = frame else {
            break;
        };
        match frame {
            Message::Text(raw) => {
                if raw.len() > max_size {
                    state.metrics.increment_validation_errors();
                    continue;
                }
                match serde_json::from_str::<ClientMessage>(&raw) {
                    Ok(ClientMessage::Auth { .. }) => {
                        // Already authenticated; a repeated AUTH frame is dropped.
                    }
                    Ok(message) => room.action(user_id.to_string(), message).await,
                    Err(err) => {
                        tracing::debug!(error = %err, "dropping malformed frame");
                    }
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
}

/// Sends an `AUTH_FAILURE` (if a human-readable reason is given) and closes
/// the socket with the given WebSocket close code. Consumes the sink since
/// the connection ends here either way.
async fn reject(mut ws_tx: SplitSink<WebSocket, Message>, code: u16, reason: Option<&str>) {
    if let Some(message) = reason {
        if code == AUTH_FAILURE_CLOSE {
            let failure = ServerMessage::AuthFailure { message: message.to_string() };
            if let Ok(json) = serde_json::to_string(&failure) {
                let _ = ws_tx.send(Message::Text(json.into())).await;
            }
        }
    }
    let frame = CloseFrame { code, reason: reason.unwrap_or("").to_string().into() };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
    let _ = ws_tx.close().await;
}
