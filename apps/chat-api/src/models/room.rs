use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::message::Message;

/// A named broadcast channel. The name doubles as the room's id.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    /// Member user IDs in join order.
    pub members: Vec<String>,
    /// Full history, oldest first.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn add_member(&mut self, user_id: &str) {
        if !self.has_member(user_id) {
            self.members.push(user_id.to_string());
        }
    }

    /// Returns whether the user was a member.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != user_id);
        self.members.len() != before
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|id| id == user_id)
    }

    /// The last `limit` messages, oldest first.
    pub fn recent_messages(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.name.clone(),
            name: self.name.clone(),
            user_count: self.members.len(),
            message_count: self.messages.len(),
            created_at: self.created_at,
        }
    }
}

/// Room listing entry returned by the HTTP API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub user_count: usize,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}
