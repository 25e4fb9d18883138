pub mod conversation;
pub mod message;
pub mod room;
pub mod user;
