use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiError;
use crate::models::user::User;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/online", get(online_users))
        .route("/users/{id}", get(get_user))
}

#[utoipa::path(
    get,
    path = "/api/users/online",
    tag = "Users",
    responses(
        (status = 200, description = "Online users in join order", body = Vec<User>),
    )
)]
pub async fn online_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.store.lock().online_snapshot())
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User record, online or not", body = User),
        (status = 404, description = "Unknown user", body = crate::error::ApiErrorBody),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .lock()
        .user(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}
