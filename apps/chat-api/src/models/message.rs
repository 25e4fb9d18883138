use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::User;

/// Delivery state of a message. There are no read receipts, so every stored
/// message is `delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Author's display name at the time of sending.
    pub user: String,
    pub user_id: String,
    pub text: String,
    /// Owning room; `None` for private messages.
    pub room: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
}

impl Message {
    pub fn new(author: &User, text: String, room: Option<String>) -> Self {
        let is_private = room.is_none();
        Self {
            id: chat_common::id::prefixed_ulid(chat_common::id::prefix::MESSAGE),
            user: author.username.clone(),
            user_id: author.id.clone(),
            text,
            room,
            timestamp: Utc::now(),
            status: DeliveryStatus::Delivered,
            is_private,
            reactions: Vec::new(),
        }
    }

    /// Record `reaction`, replacing any earlier reaction by the same user.
    pub fn upsert_reaction(&mut self, reaction: Reaction) {
        self.reactions.retain(|r| r.user_id != reaction.user_id);
        self.reactions.push(reaction);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Emoji or other short token.
    pub reaction: String,
    pub user: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Reaction {
    pub fn new(reactor: &User, token: String) -> Self {
        Self {
            reaction: token,
            user: reactor.username.clone(),
            user_id: reactor.id.clone(),
            timestamp: Utc::now(),
        }
    }
}
