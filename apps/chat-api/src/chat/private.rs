//! One-to-one conversations. Delivery is online-only: there is no mailbox for
//! offline recipients.

use std::fmt;

use crate::models::conversation::{conversation_id, PrivateConversation};
use crate::models::message::Message;
use crate::models::user::User;

use super::ChatStore;

/// A private message that was stored and should go to both participants.
#[derive(Debug, Clone)]
pub struct PrivateDelivery {
    pub conversation_id: String,
    pub message: Message,
    pub from: User,
    pub to: User,
}

/// No online user other than the sender has the requested display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOffline {
    pub to_user: String,
}

impl fmt::Display for RecipientOffline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("User is offline")
    }
}

impl std::error::Error for RecipientOffline {}

impl ChatStore {
    /// Send `text` from `from_id` to the first online user named `to_name`.
    ///
    /// Nothing is recorded when the recipient can't be found. Display names
    /// are not unique; the earliest-joined online match wins.
    pub fn send_private(
        &mut self,
        from_id: &str,
        to_name: &str,
        text: String,
    ) -> Result<PrivateDelivery, RecipientOffline> {
        let offline = || RecipientOffline {
            to_user: to_name.to_string(),
        };

        let from = self.users.get(from_id).cloned().ok_or_else(offline)?;
        let to = self
            .online_snapshot()
            .into_iter()
            .find(|u| u.username == to_name && u.id != from.id)
            .ok_or_else(offline)?;

        let id = conversation_id(&from.id, &to.id);
        let message = Message::new(&from, text, None);
        self.conversations
            .entry(id.clone())
            .or_insert_with(|| PrivateConversation::new(&from.id, &to.id))
            .messages
            .push(message.clone());

        Ok(PrivateDelivery {
            conversation_id: id,
            message,
            from,
            to,
        })
    }
}
