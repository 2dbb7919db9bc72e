use std::{io::ErrorKind, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use bytes::Bytes;
use tracing::error;

use crate::{
    application::{blog::BlogService, error::HttpError, repos::HealthRepo},
    infra::media::{MediaStorage, MediaStorageError},
    presentation::views::{
        self, ContactsTemplate, IndexTemplate, LayoutChrome, LayoutContext, PostDetailTemplate,
        PostsListTemplate, render_not_found_response, render_template_response,
    },
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub chrome: LayoutChrome,
    pub media: Arc<MediaStorage>,
    /// Normalized to start and end with `/`; stored images are served below it.
    pub media_url_prefix: String,
    pub health: Arc<dyn HealthRepo>,
}

/// Public site router. Canonical page URLs end with `/`; the bare forms
/// redirect permanently.
pub fn build_router(state: HttpState) -> Router {
    let media_route = format!("{}{{*path}}", state.media_url_prefix);

    Router::new()
        .route("/", get(index))
        .route("/posts/{slug}/", get(post_detail))
        .route("/posts/{slug}", get(post_detail_redirect))
        .route("/tags/{title}/", get(tag_filter))
        .route("/tags/{title}", get(tag_filter_redirect))
        .route("/contacts/", get(contacts))
        .route("/contacts", get(|| async { Redirect::permanent("/contacts/") }))
        .route(&media_route, get(serve_media))
        .route("/_health/db", get(public_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    match state.blog.index().await {
        Ok(content) => {
            let view = LayoutContext::new(state.chrome.clone(), content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match state.blog.post_detail(&slug).await {
        Ok(Some(content)) => {
            let chrome = state.chrome.clone().with_title(&content.title);
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(state.chrome.clone()),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_detail_redirect(Path(slug): Path<String>) -> Redirect {
    Redirect::permanent(&views::post_path(&slug))
}

async fn tag_filter(State(state): State<HttpState>, Path(title): Path<String>) -> Response {
    match state.blog.tag_filter(&title).await {
        Ok(Some(content)) => {
            let chrome = state.chrome.clone().with_title(&content.tag);
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostsListTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(state.chrome.clone()),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn tag_filter_redirect(Path(title): Path<String>) -> Redirect {
    Redirect::permanent(&views::tag_path(&title))
}

async fn contacts(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.clone().with_title("Contacts");
    let view = LayoutContext::new(chrome, state.blog.contacts());
    render_template_response(ContactsTemplate { view }, StatusCode::OK)
}

async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.clone())
}

async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";

    match state.media.read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(MediaStorageError::InvalidPath) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "File not found",
            "The requested file is not available",
        )
        .into_response(),
        Err(MediaStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "File not found",
            "The requested file is not available",
        )
        .into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored media"
            );
            HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
                err.to_string(),
            )
            .into_response()
        }
    }
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));

    response
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}
