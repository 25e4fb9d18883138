//! Gateway event names, typed payloads, and wire-format messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::message::{Message, Reaction};
use crate::models::user::User;

// ---------------------------------------------------------------------------
// Server → Client message
// ---------------------------------------------------------------------------

/// A message sent from the server to the client over WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayMessage {
    pub t: String,
    pub s: u64,
    pub d: Value,
}

impl GatewayMessage {
    pub fn dispatch(event_name: &str, seq: u64, data: Value) -> Self {
        Self {
            t: event_name.to_string(),
            s: seq,
            d: data,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server message
// ---------------------------------------------------------------------------

/// A raw frame received from the client over WebSocket.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    pub t: String,
    #[serde(default)]
    pub d: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserJoinPayload {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessagePayload {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub to_user: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub message_id: String,
    pub reaction: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPayload {
    pub user_id: String,
}

/// Every inbound event the gateway understands, with its validated payload.
#[derive(Debug)]
pub enum ClientEvent {
    UserJoin(UserJoinPayload),
    SendMessage(SendMessagePayload),
    TypingStart,
    TypingStop,
    JoinRoom(JoinRoomPayload),
    PrivateMessage(PrivateMessagePayload),
    MessageReaction(ReactionPayload),
    UserActivity,
    ReconnectUser(ReconnectPayload),
}

/// Why an inbound frame could not be turned into a [`ClientEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPayload {
    pub event: String,
    pub reason: String,
}

impl InvalidPayload {
    pub fn new(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}` payload: {}", self.event, self.reason)
    }
}

impl std::error::Error for InvalidPayload {}

impl ClientEvent {
    /// Parse a text frame into a typed event.
    pub fn from_text(text: &str) -> Result<Self, InvalidPayload> {
        let msg: ClientMessage = serde_json::from_str(text)
            .map_err(|err| InvalidPayload::new("unknown", format!("malformed frame: {err}")))?;
        Self::parse(msg)
    }

    pub fn parse(msg: ClientMessage) -> Result<Self, InvalidPayload> {
        let ClientMessage { t, d } = msg;
        // Payload-less events may omit `d` entirely.
        let d = if d.is_null() { serde_json::json!({}) } else { d };

        let event = match t.as_str() {
            EventName::USER_JOIN => Self::UserJoin(payload(&t, d)?),
            EventName::SEND_MESSAGE => Self::SendMessage(payload(&t, d)?),
            EventName::TYPING_START => Self::TypingStart,
            EventName::TYPING_STOP => Self::TypingStop,
            EventName::JOIN_ROOM => {
                let p: JoinRoomPayload = payload(&t, d)?;
                let room_name = p.room_name.trim().to_string();
                if room_name.is_empty() {
                    return Err(InvalidPayload::new(t.clone(), "roomName must not be empty"));
                }
                Self::JoinRoom(JoinRoomPayload { room_name })
            }
            EventName::PRIVATE_MESSAGE => Self::PrivateMessage(payload(&t, d)?),
            EventName::MESSAGE_REACTION => Self::MessageReaction(payload(&t, d)?),
            EventName::USER_ACTIVITY => Self::UserActivity,
            EventName::RECONNECT_USER => Self::ReconnectUser(payload(&t, d)?),
            _ => return Err(InvalidPayload::new(t.clone(), "unknown event")),
        };
        Ok(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoin(_) => EventName::USER_JOIN,
            Self::SendMessage(_) => EventName::SEND_MESSAGE,
            Self::TypingStart => EventName::TYPING_START,
            Self::TypingStop => EventName::TYPING_STOP,
            Self::JoinRoom(_) => EventName::JOIN_ROOM,
            Self::PrivateMessage(_) => EventName::PRIVATE_MESSAGE,
            Self::MessageReaction(_) => EventName::MESSAGE_REACTION,
            Self::UserActivity => EventName::USER_ACTIVITY,
            Self::ReconnectUser(_) => EventName::RECONNECT_USER,
        }
    }
}

fn payload<T: for<'de> Deserialize<'de>>(event: &str, d: Value) -> Result<T, InvalidPayload> {
    serde_json::from_value(d).map_err(|err| InvalidPayload::new(event, err.to_string()))
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// `user-joined` / `user-left`: someone entered or left the chat.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPresenceNotice {
    pub user: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub online_users: usize,
}

/// `user-joined-room` / `user-left-room`: someone moved between rooms.
#[derive(Debug, Serialize)]
pub struct RoomNotice {
    pub user: String,
    pub room: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RoomHistory<'a> {
    pub room: &'a str,
    pub messages: &'a [Message],
}

#[derive(Debug, Serialize)]
pub struct RoomJoined<'a> {
    pub room: &'a str,
    pub users: &'a [User],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice<'a> {
    pub user: &'a str,
    pub is_typing: bool,
}

/// `private-message-received`: the message plus routing names. The sender's
/// copy carries `isOwn: true`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateEnvelope<'a> {
    #[serde(flatten)]
    pub message: &'a Message,
    pub from: &'a str,
    pub to: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_own: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessageError<'a> {
    pub error: &'a str,
    pub to_user: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionNotice<'a> {
    pub message_id: &'a str,
    pub reaction: &'a str,
    pub user: &'a str,
}

impl<'a> ReactionNotice<'a> {
    pub fn new(message_id: &'a str, reaction: &'a Reaction) -> Self {
        Self {
            message_id,
            reaction: &reaction.reaction,
            user: &reaction.user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvalidPayloadNotice<'a> {
    pub event: &'a str,
    pub error: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExpired<'a> {
    pub user_id: &'a str,
}

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Event names used on the wire, inbound and outbound.
pub struct EventName;

impl EventName {
    // Client → server.
    pub const USER_JOIN: &'static str = "user-join";
    pub const SEND_MESSAGE: &'static str = "send-message";
    pub const TYPING_START: &'static str = "typing-start";
    pub const TYPING_STOP: &'static str = "typing-stop";
    pub const JOIN_ROOM: &'static str = "join-room";
    pub const PRIVATE_MESSAGE: &'static str = "private-message";
    pub const MESSAGE_REACTION: &'static str = "message-reaction";
    pub const USER_ACTIVITY: &'static str = "user-activity";
    pub const RECONNECT_USER: &'static str = "reconnect-user";

    // Server → client.
    pub const USER_REGISTERED: &'static str = "user-registered";
    pub const ONLINE_USERS_UPDATE: &'static str = "online-users-update";
    pub const USER_JOINED: &'static str = "user-joined";
    pub const USER_LEFT: &'static str = "user-left";
    pub const ROOM_HISTORY: &'static str = "room-history";
    pub const NEW_MESSAGE: &'static str = "new-message";
    pub const USER_TYPING: &'static str = "user-typing";
    pub const USER_LEFT_ROOM: &'static str = "user-left-room";
    pub const USER_JOINED_ROOM: &'static str = "user-joined-room";
    pub const ROOM_JOINED: &'static str = "room-joined";
    pub const PRIVATE_MESSAGE_RECEIVED: &'static str = "private-message-received";
    pub const PRIVATE_MESSAGE_ERROR: &'static str = "private-message-error";
    pub const MESSAGE_REACTION_ADDED: &'static str = "message-reaction-added";
    pub const INVALID_PAYLOAD: &'static str = "invalid-payload";
    pub const SESSION_EXPIRED: &'static str = "session-expired";
}
