//! JSON admin API, served on its own listener.

mod comments;
mod error;
mod models;
mod posts;
mod tags;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    response::Response,
    routing::{delete, get, patch, post, put},
};

use crate::application::admin::{
    AdminCommentService, AdminPostService, AdminTagService, AdminUserService,
};
use crate::application::repos::HealthRepo;
use crate::infra::media::MediaStorage;

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

/// Headroom for multipart framing on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AdminState {
    pub posts: Arc<AdminPostService>,
    pub tags: Arc<AdminTagService>,
    pub comments: Arc<AdminCommentService>,
    pub users: Arc<AdminUserService>,
    pub media: Arc<MediaStorage>,
    pub media_url_prefix: String,
    pub max_upload_bytes: usize,
    pub health: Arc<dyn HealthRepo>,
}

impl AdminState {
    pub(crate) fn image_url(&self, image: Option<&str>) -> Option<String> {
        image.map(|path| format!("{}{}", self.media_url_prefix, path))
    }
}

pub fn build_admin_router(state: AdminState) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/posts/{id}/tags", put(posts::replace_post_tags))
        .route("/api/posts/{id}/likes", put(posts::replace_post_likes))
        .route(
            "/api/posts/{id}/image",
            post(posts::upload_post_image)
                .delete(posts::delete_post_image)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/api/tags/{id}",
            patch(tags::rename_tag).delete(tags::delete_tag),
        )
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/comments/{id}", delete(comments::delete_comment))
        .route("/_health/db", get(admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.health.ping().await)
}
