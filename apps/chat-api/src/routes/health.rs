use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub users: UserCounts,
    pub rooms: usize,
    pub private_conversations: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCounts {
    pub total: usize,
    pub online: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store.lock();
    Json(HealthResponse {
        status: "OK".to_string(),
        users: UserCounts {
            total: store.user_count(),
            online: store.online_count(),
        },
        rooms: store.room_count(),
        private_conversations: store.conversation_count(),
        timestamp: Utc::now(),
    })
}
