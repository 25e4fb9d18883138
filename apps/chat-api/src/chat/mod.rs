//! In-memory chat state: users, rooms, private conversations, and the
//! connection ↔ user bindings.
//!
//! Everything lives in one [`ChatStore`] guarded by a single mutex
//! ([`SharedStore`]). Gateway handlers, HTTP reads, and the inactivity sweeper
//! all go through that lock, so mutations are applied one at a time and
//! per-room message order matches the order in which posts acquired it.
//!
//! Operations are split by concern across the submodules; each adds an
//! `impl ChatStore` block.

pub mod presence;
pub mod private;
pub mod rooms;
pub mod sessions;
pub mod sweeper;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::gateway::session::ConnectionId;
use crate::models::conversation::PrivateConversation;
use crate::models::room::Room;
use crate::models::user::User;

pub type SharedStore = Arc<Mutex<ChatStore>>;

pub struct ChatStore {
    users: HashMap<String, User>,
    /// User IDs in registration order.
    user_order: Vec<String>,
    rooms: HashMap<String, Room>,
    /// Room names in creation order.
    room_order: Vec<String>,
    conversations: HashMap<String, PrivateConversation>,
    /// Reverse index of `User::connection`.
    connections: HashMap<ConnectionId, String>,
    default_room: String,
    history_replay_limit: usize,
}

impl ChatStore {
    /// Build an empty store with the configured default rooms.
    pub fn new(config: &Config) -> Self {
        let mut store = Self {
            users: HashMap::new(),
            user_order: Vec::new(),
            rooms: HashMap::new(),
            room_order: Vec::new(),
            conversations: HashMap::new(),
            connections: HashMap::new(),
            default_room: config.default_room().to_string(),
            history_replay_limit: config.history_replay_limit,
        };
        for name in &config.default_rooms {
            store.ensure_room(name);
        }
        store.ensure_room(config.default_room());
        store
    }

    pub fn shared(config: &Config) -> SharedStore {
        Arc::new(Mutex::new(Self::new(config)))
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    pub fn history_replay_limit(&self) -> usize {
        self.history_replay_limit
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// All users in registration order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.user_order.iter().filter_map(|id| self.users.get(id))
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    /// All rooms in creation order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.room_order.iter().filter_map(|name| self.rooms.get(name))
    }

    pub fn conversation(&self, id: &str) -> Option<&PrivateConversation> {
        self.conversations.get(id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rooms_exist_at_startup() {
        let store = test_support::store();
        let names: Vec<&str> = store.rooms().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["general", "random", "tech", "support"]);
        assert_eq!(store.default_room(), "general");
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.conversation_count(), 0);
    }

    #[test]
    fn custom_default_room_is_created() {
        let config = Config {
            default_rooms: vec!["lobby".to_string()],
            ..Config::default()
        };
        let store = ChatStore::new(&config);
        assert_eq!(store.default_room(), "lobby");
        assert!(store.room("lobby").is_some());
        assert_eq!(store.room_count(), 1);
    }
}
