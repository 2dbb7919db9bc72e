use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::AdminState;
use super::error::ApiError;
use super::models::TagRequest;

pub async fn list_tags(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tags.list_with_counts().await?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AdminState>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let tag = state.tags.create_tag(&payload.title).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn rename_tag(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let tag = state.tags.rename_tag(id, &payload.title).await?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.tags.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
