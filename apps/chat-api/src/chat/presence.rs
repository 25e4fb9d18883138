//! Online-user view and its broadcast.
//!
//! The snapshot is recomputed on demand and always pushed in full; clients
//! never receive diffs.

use crate::gateway::events::EventName;
use crate::gateway::fanout::{GatewayBroadcast, Target};
use crate::models::user::User;

use super::ChatStore;

impl ChatStore {
    /// Online users in registration order.
    pub fn online_snapshot(&self) -> Vec<User> {
        self.users().filter(|u| u.online).cloned().collect()
    }

    pub fn online_count(&self) -> usize {
        self.users.values().filter(|u| u.online).count()
    }
}

/// Push the current online snapshot to every open connection.
pub fn broadcast_presence(broadcast: &GatewayBroadcast, store: &ChatStore) {
    let snapshot = store.online_snapshot();
    tracing::debug!(online = snapshot.len(), "broadcasting presence");
    broadcast.emit(Target::All, EventName::ONLINE_USERS_UPDATE, &snapshot);
}
