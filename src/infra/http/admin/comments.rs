use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::admin::comments::CreateCommentCommand;

use super::AdminState;
use super::error::ApiError;
use super::models::{CommentCreateRequest, CommentListEntry};

pub async fn list_comments(
    State(state): State<AdminState>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.comments.list().await?;
    let entries: Vec<CommentListEntry> = comments.into_iter().map(Into::into).collect();
    Ok(Json(entries))
}

pub async fn create_comment(
    State(state): State<AdminState>,
    payload: Result<Json<CommentCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let command = CreateCommentCommand {
        post_id: payload.post_id,
        author_id: payload.author_id,
        text: payload.text,
        published_at: payload.published_at,
    };
    let comment = state.comments.create_comment(command).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.comments.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
