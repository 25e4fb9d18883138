//! Per-connection gateway state and the connection handle type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chat_common::id::{prefix, PrefixedId};

/// Opaque handle for one live WebSocket connection.
///
/// Only minted by the gateway when a socket is accepted. It says how to reach
/// a client, not who the client is; the session registry in
/// [`crate::chat::sessions`] is the only place that maps it to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl PrefixedId for ConnectionId {
    const PREFIX: &'static str = prefix::CONNECTION;
}

impl ConnectionId {
    pub fn new() -> Self {
        Self(<Self as PrefixedId>::generate())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State for a single WebSocket connection.
pub struct GatewaySession {
    pub connection_id: ConnectionId,
    /// Monotonically increasing sequence number for outbound events.
    seq: AtomicU64,
}

impl GatewaySession {
    pub fn new() -> Self {
        Self {
            connection_id: ConnectionId::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Get the next sequence number for an outbound event.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for GatewaySession {
    fn default() -> Self {
        Self::new()
    }
}
