use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::gateway::session::ConnectionId;

/// A chat participant. Never deleted; going offline only clears the
/// connection handle.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// Live connection bound to this user. Kept off the wire.
    #[serde(skip)]
    pub connection: Option<ConnectionId>,
    pub online: bool,
    pub current_room: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, username: String, connection: ConnectionId, room: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            connection: Some(connection),
            online: true,
            current_room: room.to_string(),
            joined_at: now,
            last_seen: now,
            last_activity: now,
        }
    }
}
