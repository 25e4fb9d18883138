//! Room listing and creation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiError, FieldError};
use crate::models::room::RoomSummary;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/rooms", get(list_rooms).post(create_room))
}

// ---------------------------------------------------------------------------
// GET /api/rooms
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    responses(
        (status = 200, description = "All rooms in creation order", body = Vec<RoomSummary>),
    )
)]
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let store = state.store.lock();
    Json(store.rooms().map(|room| room.summary()).collect())
}

// ---------------------------------------------------------------------------
// POST /api/rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomSummary),
        (status = 400, description = "Malformed body, or missing or blank name", body = crate::error::ApiErrorBody),
        (status = 409, description = "Room already exists", body = crate::error::ApiErrorBody),
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
    body: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomSummary>), ApiError> {
    let Json(body) = body.map_err(|err| ApiError::bad_request(err.body_text()))?;
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::validation(vec![FieldError {
            field: "name".to_string(),
            message: "Room name is required".to_string(),
        }]));
    }

    let mut store = state.store.lock();
    let room = store
        .create_room(name)
        .ok_or_else(|| ApiError::conflict("Room already exists"))?;

    tracing::info!(room = %room.name, "room created over http");
    Ok((StatusCode::CREATED, Json(room.summary())))
}
