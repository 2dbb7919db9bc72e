use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::PostSummaryRecord;
use crate::domain::entities::TagRecord;

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub published_at: Option<OffsetDateTime>,
    pub tag_ids: Vec<Uuid>,
    pub like_user_ids: Vec<Uuid>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    pub title: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<Uuid>,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPostListItem {
    pub summary: PostSummaryRecord,
    pub tags: Vec<TagRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPostDetail {
    pub summary: PostSummaryRecord,
    pub tag_ids: Vec<Uuid>,
    pub like_user_ids: Vec<Uuid>,
}
