//! Inbound event dispatch.
//!
//! Every handler follows the same shape: lock the store, resolve the sender
//! (events from unbound connections are dropped), apply the mutation, and emit
//! the resulting events. Emitting while the lock is held keeps the outbound
//! order identical to the order mutations were applied.

use chrono::Utc;

use crate::chat::presence::broadcast_presence;
use crate::chat::sessions::{Registration, Unbound};
use crate::chat::ChatStore;
use crate::AppState;

use super::events::{
    ChatPresenceNotice, ClientEvent, EventName, InvalidPayload, InvalidPayloadNotice,
    JoinRoomPayload, PrivateEnvelope, PrivateMessageError, PrivateMessagePayload, ReactionNotice,
    ReactionPayload, ReconnectPayload, RoomHistory, RoomJoined, RoomNotice, SendMessagePayload,
    TypingNotice, UserJoinPayload,
};
use super::fanout::{GatewayBroadcast, Target};
use super::session::ConnectionId;

/// Route one parsed event from `connection`.
pub fn handle_event(state: &AppState, connection: &ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::UserJoin(payload) => user_join(state, connection, payload),
        ClientEvent::SendMessage(payload) => send_message(state, connection, payload),
        ClientEvent::TypingStart => typing(state, connection, true),
        ClientEvent::TypingStop => typing(state, connection, false),
        ClientEvent::JoinRoom(payload) => join_room(state, connection, payload),
        ClientEvent::PrivateMessage(payload) => private_message(state, connection, payload),
        ClientEvent::MessageReaction(payload) => message_reaction(state, connection, payload),
        ClientEvent::UserActivity => user_activity(state, connection),
        ClientEvent::ReconnectUser(payload) => reconnect_user(state, connection, payload),
    }
}

/// Tell the sender its frame was rejected. Nothing else happens.
pub fn handle_invalid(state: &AppState, connection: &ConnectionId, err: &InvalidPayload) {
    tracing::debug!(connection = %connection, event = %err.event, reason = %err.reason, "invalid payload");
    state.broadcast.emit(
        Target::one(connection),
        EventName::INVALID_PAYLOAD,
        &InvalidPayloadNotice {
            event: &err.event,
            error: &err.reason,
        },
    );
}

/// The socket closed: release its user, if any.
pub fn handle_disconnect(state: &AppState, connection: &ConnectionId) {
    let mut store = state.store.lock();
    let Some(unbound) = store.unbind(connection) else {
        tracing::debug!(connection = %connection, "unregistered connection closed");
        return;
    };

    tracing::info!(
        user_id = %unbound.user.id,
        username = %unbound.user.username,
        "user disconnected"
    );
    announce_departure(&state.broadcast, &store, &unbound);
    broadcast_presence(&state.broadcast, &store);
}

/// Notify the room a user was removed from that they left the chat.
pub(crate) fn announce_departure(broadcast: &GatewayBroadcast, store: &ChatStore, unbound: &Unbound) {
    let Some(room) = &unbound.left_room else {
        return;
    };
    let username = &unbound.user.username;
    broadcast.emit(
        Target::Connections(store.room_connections(room, None)),
        EventName::USER_LEFT,
        &ChatPresenceNotice {
            user: username.clone(),
            message: format!("{username} left the chat"),
            timestamp: Utc::now(),
            online_users: store.online_count(),
        },
    );
}

/// User ID bound to `connection`, or `None` (logged) so the caller drops the
/// event.
fn sender_id(store: &ChatStore, connection: &ConnectionId, event: &str) -> Option<String> {
    let id = store.resolve(connection).map(|u| u.id.clone());
    if id.is_none() {
        tracing::debug!(connection = %connection, event, "dropping event from unregistered connection");
    }
    id
}

fn user_join(state: &AppState, connection: &ConnectionId, payload: UserJoinPayload) {
    let broadcast = &state.broadcast;
    let mut store = state.store.lock();
    let Registration { user, released } = store.register(connection, payload.username.as_deref());

    if let Some(released) = &released {
        announce_departure(broadcast, &store, released);
    }

    broadcast.emit(Target::one(connection), EventName::USER_REGISTERED, &user);
    broadcast_presence(broadcast, &store);

    let room = &user.current_room;
    broadcast.emit(
        Target::Connections(store.room_connections(room, Some(connection))),
        EventName::USER_JOINED,
        &ChatPresenceNotice {
            user: user.username.clone(),
            message: format!("{} joined the chat", user.username),
            timestamp: Utc::now(),
            online_users: store.online_count(),
        },
    );

    let history = store.room_history(room);
    broadcast.emit(
        Target::one(connection),
        EventName::ROOM_HISTORY,
        &RoomHistory {
            room,
            messages: &history,
        },
    );

    tracing::info!(user_id = %user.id, username = %user.username, %room, "user joined");
}

fn send_message(state: &AppState, connection: &ConnectionId, payload: SendMessagePayload) {
    let mut store = state.store.lock();
    let Some(user_id) = sender_id(&store, connection, EventName::SEND_MESSAGE) else {
        return;
    };
    let Some(message) = store.post_message(&user_id, payload.text) else {
        return;
    };

    let room = message.room.as_deref().unwrap_or_default();
    tracing::debug!(user_id = %user_id, %room, message_id = %message.id, "message posted");
    state.broadcast.emit(
        Target::Connections(store.room_connections(room, None)),
        EventName::NEW_MESSAGE,
        &message,
    );
}

fn typing(state: &AppState, connection: &ConnectionId, is_typing: bool) {
    let store = state.store.lock();
    let Some(user) = store.resolve(connection) else {
        tracing::debug!(connection = %connection, "dropping typing event from unregistered connection");
        return;
    };

    state.broadcast.emit(
        Target::Connections(store.room_connections(&user.current_room, Some(connection))),
        EventName::USER_TYPING,
        &TypingNotice {
            user: &user.username,
            is_typing,
        },
    );
}

fn join_room(state: &AppState, connection: &ConnectionId, payload: JoinRoomPayload) {
    let broadcast = &state.broadcast;
    let mut store = state.store.lock();
    let Some(user_id) = sender_id(&store, connection, EventName::JOIN_ROOM) else {
        return;
    };
    let Some(joined) = store.join_room(&user_id, &payload.room_name) else {
        return;
    };
    let username = &joined.user.username;

    if let Some(left) = &joined.left {
        broadcast.emit(
            Target::Connections(store.room_connections(left, None)),
            EventName::USER_LEFT_ROOM,
            &RoomNotice {
                user: username.clone(),
                room: left.clone(),
                message: format!("{username} left the room"),
                timestamp: Utc::now(),
            },
        );
    }

    broadcast.emit(
        Target::Connections(store.room_connections(&joined.room, Some(connection))),
        EventName::USER_JOINED_ROOM,
        &RoomNotice {
            user: username.clone(),
            room: joined.room.clone(),
            message: format!("{username} joined the room"),
            timestamp: Utc::now(),
        },
    );

    broadcast.emit(
        Target::one(connection),
        EventName::ROOM_HISTORY,
        &RoomHistory {
            room: &joined.room,
            messages: &joined.history,
        },
    );
    broadcast.emit(
        Target::one(connection),
        EventName::ROOM_JOINED,
        &RoomJoined {
            room: &joined.room,
            users: &joined.members,
        },
    );

    tracing::info!(
        user_id = %user_id,
        from = joined.left.as_deref().unwrap_or("-"),
        to = %joined.room,
        "user moved rooms"
    );
}

fn private_message(state: &AppState, connection: &ConnectionId, payload: PrivateMessagePayload) {
    let broadcast = &state.broadcast;
    let mut store = state.store.lock();
    let Some(user_id) = sender_id(&store, connection, EventName::PRIVATE_MESSAGE) else {
        return;
    };

    match store.send_private(&user_id, &payload.to_user, payload.text) {
        Ok(delivery) => {
            let from = &delivery.from.username;
            let to = &delivery.to.username;
            if let Some(recipient) = store.connection_of(&delivery.to.id) {
                broadcast.emit(
                    Target::one(recipient),
                    EventName::PRIVATE_MESSAGE_RECEIVED,
                    &PrivateEnvelope {
                        message: &delivery.message,
                        from,
                        to,
                        is_own: false,
                    },
                );
            }
            broadcast.emit(
                Target::one(connection),
                EventName::PRIVATE_MESSAGE_RECEIVED,
                &PrivateEnvelope {
                    message: &delivery.message,
                    from,
                    to,
                    is_own: true,
                },
            );
            tracing::info!(
                conversation_id = %delivery.conversation_id,
                %from,
                %to,
                "private message delivered"
            );
        }
        Err(err) => {
            tracing::debug!(user_id = %user_id, to_user = %err.to_user, "private message recipient offline");
            broadcast.emit(
                Target::one(connection),
                EventName::PRIVATE_MESSAGE_ERROR,
                &PrivateMessageError {
                    error: &err.to_string(),
                    to_user: &err.to_user,
                },
            );
        }
    }
}

fn message_reaction(state: &AppState, connection: &ConnectionId, payload: ReactionPayload) {
    let mut store = state.store.lock();
    let Some(user_id) = sender_id(&store, connection, EventName::MESSAGE_REACTION) else {
        return;
    };
    let Some(added) = store.react(&user_id, &payload.message_id, payload.reaction) else {
        tracing::debug!(user_id = %user_id, message_id = %payload.message_id, "reaction target not found");
        return;
    };

    state.broadcast.emit(
        Target::Connections(store.room_connections(&added.room, None)),
        EventName::MESSAGE_REACTION_ADDED,
        &ReactionNotice::new(&added.message_id, &added.reaction),
    );
}

fn user_activity(state: &AppState, connection: &ConnectionId) {
    let mut store = state.store.lock();
    if let Some(user_id) = sender_id(&store, connection, EventName::USER_ACTIVITY) {
        store.record_activity(&user_id, Utc::now());
    }
}

fn reconnect_user(state: &AppState, connection: &ConnectionId, payload: ReconnectPayload) {
    let mut store = state.store.lock();
    let Some(rebound) = store.rebind(&payload.user_id, connection) else {
        tracing::debug!(connection = %connection, user_id = %payload.user_id, "reconnect for unknown user");
        return;
    };

    if let Some(released) = &rebound.released {
        announce_departure(&state.broadcast, &store, released);
    }
    broadcast_presence(&state.broadcast, &store);
    tracing::info!(user_id = %rebound.user.id, username = %rebound.user.username, "user reconnected");
}
