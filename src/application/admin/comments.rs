use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::admin::AdminError;
use crate::application::repos::{
    AdminCommentRecord, CommentsRepo, CommentsWriteRepo, CreateCommentParams, PostsRepo,
    UsersRepo,
};
use crate::domain::entities::CommentRecord;
use crate::domain::posts::require_text;

#[derive(Debug, Clone)]
pub struct CreateCommentCommand {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct AdminCommentService {
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl AdminCommentService {
    pub fn new(
        reader: Arc<dyn CommentsRepo>,
        writer: Arc<dyn CommentsWriteRepo>,
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            posts,
            users,
        }
    }

    pub async fn list(&self) -> Result<Vec<AdminCommentRecord>, AdminError> {
        self.reader.list_admin().await.map_err(AdminError::from)
    }

    pub async fn create_comment(
        &self,
        command: CreateCommentCommand,
    ) -> Result<CommentRecord, AdminError> {
        let text = require_text("text", &command.text)?;

        if self.posts.find_summary_by_id(command.post_id).await?.is_none() {
            return Err(AdminError::validation(format!(
                "unknown post `{}`",
                command.post_id
            )));
        }
        if self.users.find_by_id(command.author_id).await?.is_none() {
            return Err(AdminError::validation(format!(
                "unknown author `{}`",
                command.author_id
            )));
        }

        let params = CreateCommentParams {
            post_id: command.post_id,
            author_id: command.author_id,
            text,
            published_at: command.published_at.unwrap_or_else(OffsetDateTime::now_utc),
        };

        self.writer
            .create_comment(params)
            .await
            .map_err(AdminError::from)
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<(), AdminError> {
        self.writer
            .delete_comment(id)
            .await
            .map_err(AdminError::from_repo("comment"))
    }
}
