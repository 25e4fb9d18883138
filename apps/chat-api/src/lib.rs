pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use chat::{ChatStore, SharedStore};
use config::Config;
use gateway::fanout::GatewayBroadcast;

/// Shared application state available to all route handlers and gateway
/// sessions.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub broadcast: Arc<GatewayBroadcast>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: ChatStore::shared(&config),
            broadcast: Arc::new(GatewayBroadcast::new()),
            config: Arc::new(config),
        }
    }
}
