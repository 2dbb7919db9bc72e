use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::admin::posts::{AdminPostDetail, AdminPostListItem};
use crate::application::repos::AdminCommentRecord;
use crate::domain::entities::PostRecord;

#[derive(Debug, Deserialize)]
pub struct UserCreateRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub slug: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub like_user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct PostTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PostLikesRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentCreateRequest {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct PostListEntry {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
}

impl From<AdminPostListItem> for PostListEntry {
    fn from(item: AdminPostListItem) -> Self {
        let AdminPostListItem { summary, tags } = item;
        Self {
            id: summary.post.id,
            title: summary.post.title,
            slug: summary.post.slug,
            author: summary.author_username,
            published_at: summary.post.published_at,
            image: summary.post.image,
            tags: tags.into_iter().map(|tag| tag.title).collect(),
            likes_count: summary.likes_count,
            comments_count: summary.comments_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostRecord,
    pub author: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub tag_ids: Vec<Uuid>,
    pub like_user_ids: Vec<Uuid>,
}

impl From<AdminPostDetail> for PostDetailResponse {
    fn from(detail: AdminPostDetail) -> Self {
        Self {
            post: detail.summary.post,
            author: detail.summary.author_username,
            likes_count: detail.summary.likes_count,
            comments_count: detail.summary.comments_count,
            tag_ids: detail.tag_ids,
            like_user_ids: detail.like_user_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostImageResponse {
    pub post: PostRecord,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentListEntry {
    pub id: Uuid,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub author: String,
    pub post_id: Uuid,
    pub post: String,
}

impl From<AdminCommentRecord> for CommentListEntry {
    fn from(record: AdminCommentRecord) -> Self {
        Self {
            id: record.comment.id,
            text: record.comment.text,
            published_at: record.comment.published_at,
            author: record.author_username,
            post_id: record.comment.post_id,
            post: record.post_title,
        }
    }
}
