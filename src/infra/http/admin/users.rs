use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AdminState;
use super::error::ApiError;
use super::models::UserCreateRequest;

pub async fn list_users(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AdminState>,
    payload: Result<Json<UserCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let user = state.users.create(&payload.username).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
