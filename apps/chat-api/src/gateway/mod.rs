//! Real-time WebSocket gateway.

pub mod events;
pub mod fanout;
pub mod router;
pub mod server;
pub mod session;
