use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::admin::{AdminError, dedup_ids};
use crate::application::repos::{CreatePostParams, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::domain::posts::require_text;
use crate::domain::slug::{SlugAsyncError, derive_slug, generate_unique_slug};

use super::service::AdminPostService;
use super::types::{CreatePostCommand, UpdatePostCommand};

impl AdminPostService {
    pub async fn create_post(&self, command: CreatePostCommand) -> Result<PostRecord, AdminError> {
        let title = require_text("title", &command.title)?;
        let text = require_text("text", &command.text)?;

        self.ensure_author(command.author_id).await?;
        let tag_ids = dedup_ids(&command.tag_ids);
        self.ensure_tags(&tag_ids).await?;
        let like_user_ids = dedup_ids(&command.like_user_ids);
        self.ensure_users(&like_user_ids).await?;

        let slug = match command.slug.as_deref() {
            Some(explicit) => derive_slug(explicit)?,
            None => self.unique_slug(&title).await?,
        };

        let params = CreatePostParams {
            title,
            text,
            slug,
            author_id: command.author_id,
            published_at: command.published_at.unwrap_or_else(OffsetDateTime::now_utc),
            tag_ids,
            like_user_ids,
        };

        self.writer
            .create_post(params)
            .await
            .map_err(AdminError::from)
    }

    pub async fn update_post(&self, command: UpdatePostCommand) -> Result<PostRecord, AdminError> {
        let current = self
            .reader
            .find_summary_by_id(command.id)
            .await?
            .ok_or(AdminError::not_found("post"))?
            .post;

        let title = match command.title.as_deref() {
            Some(value) => require_text("title", value)?,
            None => current.title,
        };
        let text = match command.text.as_deref() {
            Some(value) => require_text("text", value)?,
            None => current.text,
        };
        let slug = match command.slug.as_deref() {
            Some(value) => derive_slug(value)?,
            None => current.slug,
        };
        let author_id = match command.author_id {
            Some(author_id) => {
                self.ensure_author(author_id).await?;
                author_id
            }
            None => current.author_id,
        };

        let params = UpdatePostParams {
            id: command.id,
            title,
            text,
            slug,
            author_id,
            published_at: command.published_at.unwrap_or(current.published_at),
        };

        self.writer
            .update_post(params)
            .await
            .map_err(AdminError::from_repo("post"))
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<PostRecord, AdminError> {
        let post = self
            .reader
            .find_summary_by_id(id)
            .await?
            .ok_or(AdminError::not_found("post"))?
            .post;

        self.writer
            .delete_post(id)
            .await
            .map_err(AdminError::from_repo("post"))?;

        Ok(post)
    }

    pub async fn replace_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), AdminError> {
        self.ensure_post(post_id).await?;
        let tag_ids = dedup_ids(tag_ids);
        self.ensure_tags(&tag_ids).await?;

        self.writer
            .replace_post_tags(post_id, &tag_ids)
            .await
            .map_err(AdminError::from)
    }

    pub async fn replace_likes(&self, post_id: Uuid, user_ids: &[Uuid]) -> Result<(), AdminError> {
        self.ensure_post(post_id).await?;
        let user_ids = dedup_ids(user_ids);
        self.ensure_users(&user_ids).await?;

        self.writer
            .replace_post_likes(post_id, &user_ids)
            .await
            .map_err(AdminError::from)
    }

    /// Point the post at a new stored image (or none). Returns the updated
    /// post and the image path it replaced, so the caller can remove the file.
    pub async fn replace_image(
        &self,
        post_id: Uuid,
        image: Option<String>,
    ) -> Result<(PostRecord, Option<String>), AdminError> {
        let previous = self.ensure_post(post_id).await?.image;

        let post = self
            .writer
            .update_post_image(post_id, image)
            .await
            .map_err(AdminError::from_repo("post"))?;

        let replaced = previous.filter(|old| post.image.as_deref() != Some(old.as_str()));
        Ok((post, replaced))
    }

    pub(crate) async fn ensure_post(&self, id: Uuid) -> Result<PostRecord, AdminError> {
        self.reader
            .find_summary_by_id(id)
            .await?
            .map(|summary| summary.post)
            .ok_or(AdminError::not_found("post"))
    }

    async fn unique_slug(&self, title: &str) -> Result<String, AdminError> {
        let reader = self.reader.clone();
        match generate_unique_slug(title, move |candidate| {
            let reader = reader.clone();
            async move { reader.slug_exists(&candidate).await.map(|taken| !taken) }
        })
        .await
        {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(err)) => Err(err.into()),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminError::Repo(err)),
        }
    }

    async fn ensure_author(&self, author_id: Uuid) -> Result<(), AdminError> {
        match self.users.find_by_id(author_id).await? {
            Some(_) => Ok(()),
            None => Err(AdminError::validation(format!(
                "unknown author `{author_id}`"
            ))),
        }
    }

    async fn ensure_users(&self, user_ids: &[Uuid]) -> Result<(), AdminError> {
        for user_id in user_ids {
            if self.users.find_by_id(*user_id).await?.is_none() {
                return Err(AdminError::validation(format!("unknown user `{user_id}`")));
            }
        }
        Ok(())
    }

    async fn ensure_tags(&self, tag_ids: &[Uuid]) -> Result<(), AdminError> {
        for tag_id in tag_ids {
            if self.tags.find_by_id(*tag_id).await?.is_none() {
                return Err(AdminError::validation(format!("unknown tag `{tag_id}`")));
            }
        }
        Ok(())
    }
}
