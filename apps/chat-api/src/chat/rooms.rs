//! Room manager: membership, history, and reactions.

use crate::models::message::{Message, Reaction};
use crate::models::room::Room;
use crate::models::user::User;

use super::ChatStore;

/// Result of a successful [`ChatStore::join_room`].
#[derive(Debug, Clone)]
pub struct RoomJoin {
    pub user: User,
    /// Room the user was removed from, if it was a member of one.
    pub left: Option<String>,
    pub room: String,
    /// Most recent messages of the joined room, oldest first.
    pub history: Vec<Message>,
    /// Current members of the joined room, the joining user included.
    pub members: Vec<User>,
}

/// A reaction recorded on a room message.
#[derive(Debug, Clone)]
pub struct ReactionAdded {
    pub room: String,
    pub message_id: String,
    pub reaction: Reaction,
}

impl ChatStore {
    /// Get or create a room. Idempotent.
    pub fn ensure_room(&mut self, name: &str) -> &mut Room {
        if !self.rooms.contains_key(name) {
            tracing::debug!(room = %name, "creating room");
            self.room_order.push(name.to_string());
        }
        self.rooms
            .entry(name.to_string())
            .or_insert_with(|| Room::new(name))
    }

    /// Create a room that must not exist yet. Returns `None` if it does.
    pub fn create_room(&mut self, name: &str) -> Option<&Room> {
        if self.rooms.contains_key(name) {
            return None;
        }
        Some(&*self.ensure_room(name))
    }

    /// Move a user out of its current room and into `room_name`, creating the
    /// room if needed. Returns `None` if the user is unknown.
    pub fn join_room(&mut self, user_id: &str, room_name: &str) -> Option<RoomJoin> {
        let old_room = self.users.get(user_id)?.current_room.clone();

        let mut left = None;
        if let Some(room) = self.rooms.get_mut(&old_room) {
            if room.remove_member(user_id) {
                left = Some(old_room);
            }
        }

        self.ensure_room(room_name).add_member(user_id);
        let user = self.users.get_mut(user_id)?;
        user.current_room = room_name.to_string();
        let user = user.clone();

        Some(RoomJoin {
            user,
            left,
            room: room_name.to_string(),
            history: self.room_history(room_name),
            members: self.room_members(room_name),
        })
    }

    /// The replayable tail of a room's history.
    pub fn room_history(&self, room_name: &str) -> Vec<Message> {
        self.rooms
            .get(room_name)
            .map(|room| room.recent_messages(self.history_replay_limit).to_vec())
            .unwrap_or_default()
    }

    /// Member records of a room in join order.
    pub fn room_members(&self, room_name: &str) -> Vec<User> {
        let Some(room) = self.rooms.get(room_name) else {
            return Vec::new();
        };
        room.members
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .collect()
    }

    /// Append a message to the user's current room.
    pub fn post_message(&mut self, user_id: &str, text: String) -> Option<Message> {
        let user = self.users.get(user_id)?;
        let room_name = user.current_room.clone();
        let message = Message::new(user, text, Some(room_name.clone()));
        self.ensure_room(&room_name).messages.push(message.clone());
        Some(message)
    }

    /// React to a message in the user's current room, replacing the user's
    /// previous reaction on it. `None` if the message isn't in that room.
    pub fn react(&mut self, user_id: &str, message_id: &str, token: String) -> Option<ReactionAdded> {
        let user = self.users.get(user_id)?;
        let reaction = Reaction::new(user, token);
        let room = self.rooms.get_mut(&user.current_room)?;
        let message = room.messages.iter_mut().find(|m| m.id == message_id)?;
        message.upsert_reaction(reaction.clone());

        Some(ReactionAdded {
            room: room.name.clone(),
            message_id: message_id.to_string(),
            reaction,
        })
    }
}
