use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    AdminCommentRecord, CommentWithAuthor, CommentsRepo, CommentsWriteRepo, CreateCommentParams,
    RepoError,
};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    text: String,
    published_at: OffsetDateTime,
    author_id: Uuid,
    post_id: Uuid,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            published_at: row.published_at,
            author_id: row.author_id,
            post_id: row.post_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentWithAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
}

#[derive(sqlx::FromRow)]
struct AdminCommentRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
    post_title: String,
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
            r#"
            SELECT c.id, c.text, c.published_at, c.author_id, c.post_id,
                   u.username AS author_username
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.published_at, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| CommentWithAuthor {
                comment: row.comment.into(),
                author_username: row.author_username,
            })
            .collect())
    }

    async fn list_admin(&self) -> Result<Vec<AdminCommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, AdminCommentRow>(
            r#"
            SELECT c.id, c.text, c.published_at, c.author_id, c.post_id,
                   u.username AS author_username,
                   p.title AS post_title
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            INNER JOIN posts p ON p.id = c.post_id
            ORDER BY c.published_at DESC, c.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AdminCommentRecord {
                comment: row.comment.into(),
                author_username: row.author_username,
                post_title: row.post_title,
            })
            .collect())
    }
}

#[async_trait]
impl CommentsWriteRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, text, published_at, author_id, post_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, text, published_at, author_id, post_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.text)
        .bind(params.published_at)
        .bind(params.author_id)
        .bind(params.post_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
