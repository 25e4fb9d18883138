//! Broadcast hub for dispatching gateway events to connected sessions.
//!
//! Uses a single `tokio::sync::broadcast` channel. Recipients are resolved by
//! the sender while it holds the store lock, so each payload carries an
//! explicit target and every session filters locally on its own handle.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use super::session::ConnectionId;

/// Capacity of the broadcast channel. Slow receivers that fall behind will
/// skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// Which connections a payload is meant for.
#[derive(Debug, Clone)]
pub enum Target {
    /// Every open connection, registered or not.
    All,
    Connections(Vec<ConnectionId>),
}

impl Target {
    pub fn one(connection: &ConnectionId) -> Self {
        Self::Connections(vec![connection.clone()])
    }

    pub fn includes(&self, connection: &ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::Connections(ids) => ids.contains(connection),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Connections(ids) if ids.is_empty())
    }
}

/// A payload broadcast to all connected gateway sessions.
#[derive(Debug, Clone)]
pub struct BroadcastPayload {
    pub target: Target,
    /// The dispatch event name (e.g. "new-message").
    pub event_name: String,
    /// Serialized event data (serde_json::Value).
    pub data: Value,
}

/// The process-wide broadcast hub, shared through `AppState`.
#[derive(Clone)]
pub struct GatewayBroadcast {
    sender: broadcast::Sender<Arc<BroadcastPayload>>,
}

impl GatewayBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the broadcast channel. Each gateway session should call
    /// this once to get its own receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BroadcastPayload>> {
        self.sender.subscribe()
    }

    /// Dispatch an event to the sessions named by its target.
    pub fn dispatch(&self, payload: BroadcastPayload) {
        if payload.target.is_empty() {
            return;
        }
        // Err only means no session is connected.
        let _ = self.sender.send(Arc::new(payload));
    }

    /// Serialize `data` and dispatch it under `event_name`.
    pub fn emit<T: Serialize>(&self, target: Target, event_name: &str, data: &T) {
        match serde_json::to_value(data) {
            Ok(data) => self.dispatch(BroadcastPayload {
                target,
                event_name: event_name.to_string(),
                data,
            }),
            Err(err) => {
                tracing::error!(?err, event = event_name, "failed to serialize gateway event");
            }
        }
    }
}

impl Default for GatewayBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
