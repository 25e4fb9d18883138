pub mod health;
pub mod rooms;
pub mod users;

use axum::Router;
use utoipa::OpenApi;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest("/api", rooms::router().merge(users::router()))
        .fallback(not_found)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Rooms
        rooms::list_rooms,
        rooms::create_room,
        // Users
        users::online_users,
        users::get_user,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::user::User,
            crate::models::room::RoomSummary,
            // Route request/response types
            health::HealthResponse,
            health::UserCounts,
            rooms::CreateRoomRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Rooms", description = "Chat rooms"),
        (name = "Users", description = "Chat participants"),
    )
)]
pub struct ApiDoc;
