//! Repository traits describing persistence adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, TagRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// A post together with the aggregates computed in the same query, so list
/// rendering never issues a follow-up query per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummaryRecord {
    pub post: PostRecord,
    pub author_username: String,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagWithCount {
    pub id: Uuid,
    pub title: String,
    pub posts_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentWithAuthor {
    pub comment: CommentRecord,
    pub author_username: String,
}

/// Comment row as listed in the admin surface: author and parent post titles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminCommentRecord {
    pub comment: CommentRecord,
    pub author_username: String,
    pub post_title: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: Uuid,
    pub published_at: OffsetDateTime,
    pub tag_ids: Vec<Uuid>,
    pub like_user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: Uuid,
    pub published_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub published_at: OffsetDateTime,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered by distinct like count, most liked first.
    async fn list_popular(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError>;

    /// Posts ordered by publication time, newest first.
    async fn list_fresh(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError>;

    /// Posts carrying the given tag, newest first.
    async fn list_for_tag(
        &self,
        tag_id: Uuid,
        limit: u32,
    ) -> Result<Vec<PostSummaryRecord>, RepoError>;

    async fn find_summary_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostSummaryRecord>, RepoError>;

    async fn find_summary_by_id(&self, id: Uuid) -> Result<Option<PostSummaryRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<PostSummaryRecord>, RepoError>;

    async fn list_like_user_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post_image(
        &self,
        id: Uuid,
        image: Option<String>,
    ) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    async fn replace_post_likes(
        &self,
        post_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Tags ordered by number of associated posts, largest first.
    async fn list_popular(&self, limit: u32) -> Result<Vec<TagWithCount>, RepoError>;

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, RepoError>;

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError>;

    /// Tags of several posts in one round trip, keyed by post id. Posts without
    /// tags may be absent from the map.
    async fn list_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagRecord>>, RepoError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    async fn create_tag(&self, title: &str) -> Result<TagRecord, RepoError>;

    async fn update_tag(&self, id: Uuid, title: &str) -> Result<TagRecord, RepoError>;

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments of one post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;

    async fn list_admin(&self) -> Result<Vec<AdminCommentRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait UsersWriteRepo: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
