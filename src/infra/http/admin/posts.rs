use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::admin::posts::{CreatePostCommand, UpdatePostCommand};
use crate::domain::posts::image_extension;
use crate::infra::media::MediaStorageError;

use super::AdminState;
use super::error::{ApiError, codes};
use super::models::{
    PostCreateRequest, PostDetailResponse, PostImageResponse, PostLikesRequest, PostListEntry,
    PostTagsRequest, PostUpdateRequest,
};

const SOURCE: &str = "infra::http::admin::posts";

pub async fn list_posts(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list().await?;
    let entries: Vec<PostListEntry> = posts.into_iter().map(Into::into).collect();
    Ok(Json(entries))
}

pub async fn get_post(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let detail = state.posts.load(id).await?;
    Ok(Json(PostDetailResponse::from(detail)))
}

pub async fn create_post(
    State(state): State<AdminState>,
    payload: Result<Json<PostCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let command = CreatePostCommand {
        title: payload.title,
        text: payload.text,
        author_id: payload.author_id,
        slug: payload.slug,
        published_at: payload.published_at,
        tag_ids: payload.tag_ids,
        like_user_ids: payload.like_user_ids,
    };

    let post = state.posts.create_post(command).await?;
    info!(target: SOURCE, post_id = %post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PostUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let command = UpdatePostCommand {
        id,
        title: payload.title,
        text: payload.text,
        slug: payload.slug,
        author_id: payload.author_id,
        published_at: payload.published_at,
    };

    let post = state.posts.update_post(command).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let post = state.posts.delete_post(id).await?;
    if let Some(image) = post.image.as_deref() {
        remove_stored_image(&state, image).await;
    }
    info!(target: SOURCE, post_id = %post.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_post_tags(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PostTagsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    state.posts.replace_tags(id, &payload.tag_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_post_likes(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PostLikesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    state.posts.replace_likes(id, &payload.user_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_post_image(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.posts.ensure_post(id).await?;

    let mut filename = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_to_api(err, "Invalid multipart payload", state.max_upload_bytes))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                multipart_to_api(err, "Failed to read upload", state.max_upload_bytes)
            })?);
            break;
        }
    }

    let filename = filename.ok_or_else(|| ApiError::bad_request("Missing file", None))?;
    let data = data.ok_or_else(|| ApiError::bad_request("Missing file", None))?;
    image_extension(&filename).map_err(|err| ApiError::invalid_input(err.to_string()))?;
    if data.len() > state.max_upload_bytes {
        return Err(payload_too_large(state.max_upload_bytes));
    }

    let stored = state
        .media
        .store(&filename, data)
        .await
        .map_err(media_to_api)?;

    let (post, replaced) = match state.posts.replace_image(id, Some(stored.clone())).await {
        Ok(result) => result,
        Err(err) => {
            remove_stored_image(&state, &stored).await;
            return Err(err.into());
        }
    };
    if let Some(old) = replaced.as_deref() {
        remove_stored_image(&state, old).await;
    }

    info!(target: SOURCE, post_id = %post.id, image = %stored, "post image stored");
    let image_url = state.image_url(post.image.as_deref());
    Ok(Json(PostImageResponse { post, image_url }))
}

pub async fn delete_post_image(
    State(state): State<AdminState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let (post, replaced) = state.posts.replace_image(id, None).await?;
    if let Some(old) = replaced.as_deref() {
        remove_stored_image(&state, old).await;
    }
    Ok(Json(PostImageResponse {
        post,
        image_url: None,
    }))
}

async fn remove_stored_image(state: &AdminState, stored_path: &str) {
    if let Err(err) = state.media.delete(stored_path).await {
        warn!(
            target: SOURCE,
            path = %stored_path,
            error = %err,
            "failed to remove stored image"
        );
    }
}

fn payload_too_large(limit: usize) -> ApiError {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        codes::PAYLOAD_TOO_LARGE,
        "Image too large",
        Some(format!("limit is {limit} bytes")),
    )
}

/// The body limit surfaces inside the multipart stream, so a too-large
/// request arrives here as a read error carrying 413.
fn multipart_to_api(err: MultipartError, message: &'static str, limit: usize) -> ApiError {
    let status = err.status();
    warn!(
        target: SOURCE,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => payload_too_large(limit),
        _ => ApiError::bad_request(message, Some(err.body_text())),
    }
}

fn media_to_api(err: MediaStorageError) -> ApiError {
    match err {
        MediaStorageError::EmptyPayload => ApiError::invalid_input("uploaded file is empty"),
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPLOAD,
            "Failed to store image",
            Some(other.to_string()),
        ),
    }
}
