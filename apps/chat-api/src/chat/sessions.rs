//! Session registry: binding live connections to users.
//!
//! This is the only place that translates between a [`ConnectionId`] and a
//! user ID. A connection maps to at most one user and a user holds at most one
//! connection; `User::online` is true exactly when a connection is bound.

use chrono::{DateTime, Utc};

use crate::gateway::session::ConnectionId;
use crate::models::user::User;

use super::ChatStore;

/// Result of [`ChatStore::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// User previously bound to the same connection, now released.
    pub released: Option<Unbound>,
}

/// A user that has just lost its connection.
#[derive(Debug, Clone)]
pub struct Unbound {
    /// The user record after going offline.
    pub user: User,
    pub connection: ConnectionId,
    /// Room whose membership the user was removed from.
    pub left_room: Option<String>,
}

/// Result of [`ChatStore::rebind`].
#[derive(Debug, Clone)]
pub struct Rebound {
    pub user: User,
    /// A different user that was bound to the connection, now released.
    pub released: Option<Unbound>,
}

impl ChatStore {
    /// Create a new user bound to `connection` and place it in the default
    /// room. A blank or missing name becomes `User-<shortId>`.
    pub fn register(&mut self, connection: &ConnectionId, username: Option<&str>) -> Registration {
        let released = self.unbind(connection);

        let id = chat_common::id::prefixed_ulid(chat_common::id::prefix::USER);
        let username = match username.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("User-{}", chat_common::id::short_id(&id)),
        };

        let room = self.default_room.clone();
        let user = User::new(id.clone(), username, connection.clone(), &room);
        self.ensure_room(&room).add_member(&id);
        self.connections.insert(connection.clone(), id.clone());
        self.user_order.push(id.clone());
        self.users.insert(id, user.clone());

        Registration { user, released }
    }

    /// The user bound to `connection`, if any.
    pub fn resolve(&self, connection: &ConnectionId) -> Option<&User> {
        let user_id = self.connections.get(connection)?;
        self.users.get(user_id)
    }

    /// Release the user bound to `connection`. The user record is kept.
    pub fn unbind(&mut self, connection: &ConnectionId) -> Option<Unbound> {
        let user_id = self.connections.get(connection)?.clone();
        self.release(&user_id, Utc::now())
    }

    /// Attach an existing user to a new connection (reconnect). Returns `None`
    /// when the user ID is unknown.
    pub fn rebind(&mut self, user_id: &str, connection: &ConnectionId) -> Option<Rebound> {
        if !self.users.contains_key(user_id) {
            return None;
        }

        let other = self
            .connections
            .get(connection)
            .filter(|bound| bound.as_str() != user_id)
            .cloned();
        let released = other.and_then(|bound| self.release(&bound, Utc::now()));

        let now = Utc::now();
        let user = self.users.get_mut(user_id)?;
        let previous = user.connection.replace(connection.clone());
        user.online = true;
        user.last_activity = now;
        let room = user.current_room.clone();
        let user = user.clone();

        if let Some(previous) = previous.filter(|c| c != connection) {
            self.connections.remove(&previous);
        }
        self.connections.insert(connection.clone(), user_id.to_string());
        self.ensure_room(&room).add_member(user_id);

        Some(Rebound { user, released })
    }

    /// Connections of the members of `room`, optionally excluding one.
    pub fn room_connections(&self, room: &str, except: Option<&ConnectionId>) -> Vec<ConnectionId> {
        let Some(room) = self.rooms.get(room) else {
            return Vec::new();
        };
        room.members
            .iter()
            .filter_map(|id| self.users.get(id))
            .filter_map(|user| user.connection.clone())
            .filter(|conn| Some(conn) != except)
            .collect()
    }

    /// The connection currently bound to `user_id`.
    pub fn connection_of(&self, user_id: &str) -> Option<&ConnectionId> {
        self.users.get(user_id)?.connection.as_ref()
    }

    /// Take a user offline: clear its connection, stamp `last_seen`, and
    /// remove it from its room's membership.
    pub(super) fn release(&mut self, user_id: &str, now: DateTime<Utc>) -> Option<Unbound> {
        let user = self.users.get_mut(user_id)?;
        let connection = user.connection.take()?;
        user.online = false;
        user.last_seen = now;
        let user = user.clone();

        self.connections.remove(&connection);
        let mut left_room = None;
        if let Some(room) = self.rooms.get_mut(&user.current_room) {
            if room.remove_member(user_id) {
                left_room = Some(room.name.clone());
            }
        }

        Some(Unbound {
            user,
            connection,
            left_room,
        })
    }
}
