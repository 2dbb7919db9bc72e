use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostSummaryRecord, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, limit_param, map_sqlx_error};

/// Post columns plus the author name and both counters. The counters are
/// correlated sub-selects so joining tags or likes can never multiply them.
const POST_SUMMARY_SELECT: &str = r#"
    SELECT
        p.id,
        p.title,
        p.text,
        p.image,
        p.published_at,
        p.slug,
        p.author_id,
        u.username AS author_username,
        (SELECT COUNT(DISTINCT pl.user_id) FROM post_likes pl WHERE pl.post_id = p.id) AS likes_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
"#;

const POST_COLUMNS: &str = "id, title, text, image, published_at, slug, author_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    text: String,
    image: Option<String>,
    published_at: OffsetDateTime,
    slug: String,
    author_id: Uuid,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            text: row.text,
            image: row.image,
            published_at: row.published_at,
            slug: row.slug,
            author_id: row.author_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    likes_count: i64,
    comments_count: i64,
}

impl From<PostSummaryRow> for PostSummaryRecord {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            post: row.post.into(),
            author_username: row.author_username,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
        }
    }
}

impl PostgresRepositories {
    async fn fetch_summaries(
        &self,
        sql: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let mut query = sqlx::query_as::<_, PostSummaryRow>(sql);
        if let Some(limit) = limit {
            query = query.bind(limit_param(limit));
        }

        let rows = query.fetch_all(self.pool()).await.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostSummaryRecord::from).collect())
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_popular(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let sql = format!(
            "{POST_SUMMARY_SELECT} ORDER BY likes_count DESC, p.published_at DESC, p.id LIMIT $1"
        );
        self.fetch_summaries(&sql, Some(limit)).await
    }

    async fn list_fresh(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let sql = format!("{POST_SUMMARY_SELECT} ORDER BY p.published_at DESC, p.id LIMIT $1");
        self.fetch_summaries(&sql, Some(limit)).await
    }

    async fn list_for_tag(
        &self,
        tag_id: Uuid,
        limit: u32,
    ) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let sql = format!(
            "{POST_SUMMARY_SELECT} \
             WHERE EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = $1) \
             ORDER BY p.published_at DESC, p.id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(tag_id)
            .bind(limit_param(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostSummaryRecord::from).collect())
    }

    async fn find_summary_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostSummaryRecord>, RepoError> {
        let sql = format!("{POST_SUMMARY_SELECT} WHERE p.slug = $1");
        let row = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostSummaryRecord::from))
    }

    async fn find_summary_by_id(&self, id: Uuid) -> Result<Option<PostSummaryRecord>, RepoError> {
        let sql = format!("{POST_SUMMARY_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostSummaryRecord::from))
    }

    async fn list_all(&self) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let sql = format!("{POST_SUMMARY_SELECT} ORDER BY p.published_at DESC, p.id");
        self.fetch_summaries(&sql, None).await
    }

    async fn list_like_user_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM post_likes WHERE post_id = $1 ORDER BY user_id",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO posts (id, title, text, published_at, slug, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.title)
            .bind(&params.text)
            .bind(params.published_at)
            .bind(&params.slug)
            .bind(params.author_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if !params.tag_ids.is_empty() {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::uuid[])")
                .bind(row.id)
                .bind(&params.tag_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        if !params.like_user_ids.is_empty() {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) SELECT $1, UNNEST($2::uuid[])")
                .bind(row.id)
                .bind(&params.like_user_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts SET title = $2, text = $3, slug = $4, author_id = $5, published_at = $6 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.id)
            .bind(&params.title)
            .bind(&params.text)
            .bind(&params.slug)
            .bind(params.author_id)
            .bind(params.published_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn update_post_image(
        &self,
        id: Uuid,
        image: Option<String>,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!("UPDATE posts SET image = $2 WHERE id = $1 RETURNING {POST_COLUMNS}");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(image)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if !tag_ids.is_empty() {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::uuid[])")
                .bind(post_id)
                .bind(tag_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn replace_post_likes(
        &self,
        post_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if !user_ids.is_empty() {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) SELECT $1, UNNEST($2::uuid[])")
                .bind(post_id)
                .bind(user_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
