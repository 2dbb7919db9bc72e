use uuid::Uuid;

use crate::application::admin::AdminError;

use super::service::AdminPostService;
use super::types::{AdminPostDetail, AdminPostListItem};

impl AdminPostService {
    pub async fn list(&self) -> Result<Vec<AdminPostListItem>, AdminError> {
        let posts = self.reader.list_all().await?;
        let ids: Vec<Uuid> = posts.iter().map(|summary| summary.post.id).collect();
        let mut tags = self.tags.list_for_posts(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|summary| AdminPostListItem {
                tags: tags.remove(&summary.post.id).unwrap_or_default(),
                summary,
            })
            .collect())
    }

    pub async fn load(&self, id: Uuid) -> Result<AdminPostDetail, AdminError> {
        let summary = self
            .reader
            .find_summary_by_id(id)
            .await?
            .ok_or(AdminError::not_found("post"))?;

        let tag_ids = self
            .tags
            .list_for_post(id)
            .await?
            .into_iter()
            .map(|tag| tag.id)
            .collect();
        let like_user_ids = self.reader.list_like_user_ids(id).await?;

        Ok(AdminPostDetail {
            summary,
            tag_ids,
            like_user_ids,
        })
    }
}
