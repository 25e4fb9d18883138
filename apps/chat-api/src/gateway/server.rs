//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::AppState;

use super::events::{ClientEvent, GatewayMessage};
use super::fanout::BroadcastPayload;
use super::router::{handle_disconnect, handle_event, handle_invalid};
use super::session::GatewaySession;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, ws_rx) = socket.split();
    let session = Arc::new(GatewaySession::new());

    // Subscribe before reading anything so events caused by this
    // connection's first frame are not missed.
    let broadcast_rx = state.broadcast.subscribe();

    tracing::info!(connection = %session.connection_id, "gateway connection opened");

    run_session(&state, session.clone(), ws_tx, ws_rx, broadcast_rx).await;

    handle_disconnect(&state, &session.connection_id);
    tracing::info!(connection = %session.connection_id, "gateway connection closed");
}

/// Main session event loop: route client frames, forward targeted broadcasts.
async fn run_session(
    state: &AppState,
    session: Arc<GatewaySession>,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut broadcast_rx: broadcast::Receiver<Arc<BroadcastPayload>>,
) {
    let connection = &session.connection_id;

    loop {
        tokio::select! {
            // Client sends us a frame.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ClientEvent::from_text(&text) {
                        Ok(event) => {
                            tracing::trace!(connection = %connection, event = event.name(), "inbound event");
                            handle_event(state, connection, event);
                        }
                        Err(err) => handle_invalid(state, connection, &err),
                    },
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection = %connection, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            // Broadcast event from the fanout hub.
            result = broadcast_rx.recv() => {
                match result {
                    Ok(payload) => {
                        if !payload.target.includes(connection) {
                            continue;
                        }
                        if send_dispatch(&mut ws_tx, &session, &payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            connection = %connection,
                            skipped = n,
                            "gateway session lagged behind broadcast"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Frame one payload as `{t, s, d}` and write it to the socket.
async fn send_dispatch(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    session: &GatewaySession,
    payload: &BroadcastPayload,
) -> Result<(), axum::Error> {
    let msg = GatewayMessage::dispatch(&payload.event_name, session.next_seq(), payload.data.clone());
    let json = match serde_json::to_string(&msg) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(?err, event = %payload.event_name, "failed to encode gateway frame");
            return Ok(());
        }
    };
    ws_tx.send(Message::Text(json.into())).await
}
