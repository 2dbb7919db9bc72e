//! In-memory repositories and router builders shared by the HTTP tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::Router;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use lectern::application::admin::{
    AdminCommentService, AdminPostService, AdminTagService, AdminUserService,
};
use lectern::application::blog::BlogService;
use lectern::application::repos::{
    AdminCommentRecord, CommentWithAuthor, CommentsRepo, CommentsWriteRepo, CreateCommentParams,
    CreatePostParams, HealthRepo, PostSummaryRecord, PostsRepo, PostsWriteRepo, RepoError,
    TagWithCount, TagsRepo, TagsWriteRepo, UpdatePostParams, UsersRepo, UsersWriteRepo,
};
use lectern::domain::entities::{CommentRecord, PostRecord, TagRecord, UserRecord};
use lectern::infra::http::{self, AdminState, HttpState};
use lectern::infra::media::MediaStorage;
use lectern::presentation::views::LayoutChrome;

pub const MEDIA_PREFIX: &str = "/media/";
pub const MAX_UPLOAD_BYTES: usize = 1024;

#[derive(Default)]
struct Store {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    tags: Vec<TagRecord>,
    post_tags: Vec<(Uuid, Uuid)>,
    likes: Vec<(Uuid, Uuid)>,
    comments: Vec<CommentRecord>,
}

impl Store {
    fn summary(&self, post: &PostRecord) -> PostSummaryRecord {
        let author_username = self
            .users
            .iter()
            .find(|user| user.id == post.author_id)
            .map(|user| user.username.clone())
            .unwrap_or_default();
        PostSummaryRecord {
            post: post.clone(),
            author_username,
            likes_count: self.likes.iter().filter(|(p, _)| *p == post.id).count() as i64,
            comments_count: self.comments.iter().filter(|c| c.post_id == post.id).count() as i64,
        }
    }

    fn summaries_newest_first(&self) -> Vec<PostSummaryRecord> {
        let mut rows: Vec<_> = self.posts.iter().map(|post| self.summary(post)).collect();
        rows.sort_by(|a, b| {
            b.post
                .published_at
                .cmp(&a.post.published_at)
                .then(a.post.id.cmp(&b.post.id))
        });
        rows
    }

    fn tags_of(&self, post_id: Uuid) -> Vec<TagRecord> {
        let mut tags: Vec<TagRecord> = self
            .post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .filter_map(|(_, t)| self.tags.iter().find(|tag| tag.id == *t).cloned())
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        tags
    }

    fn tag_counts(&self) -> Vec<TagWithCount> {
        self.tags
            .iter()
            .map(|tag| TagWithCount {
                id: tag.id,
                title: tag.title.clone(),
                posts_count: self.post_tags.iter().filter(|(_, t)| *t == tag.id).count() as i64,
            })
            .collect()
    }

    fn username(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|user| user.id == id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }
}

/// Thread-safe fake of the Postgres adapter with the same orderings and
/// constraint names.
#[derive(Default)]
pub struct MemoryRepo {
    store: Mutex<Store>,
    fail_health: bool,
}

impl MemoryRepo {
    pub fn with_failing_health() -> Self {
        Self {
            fail_health: true,
            ..Self::default()
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("store lock")
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store().users.push(UserRecord {
            id,
            username: username.to_string(),
            created_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn add_tag(&self, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store().tags.push(TagRecord {
            id,
            title: title.to_string(),
        });
        id
    }

    pub fn add_post(
        &self,
        author_id: Uuid,
        title: &str,
        slug: &str,
        published_at: OffsetDateTime,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store().posts.push(PostRecord {
            id,
            title: title.to_string(),
            text: format!("{title} body text"),
            image: None,
            published_at,
            slug: slug.to_string(),
            author_id,
        });
        id
    }

    pub fn tag_post(&self, post_id: Uuid, tag_id: Uuid) {
        self.store().post_tags.push((post_id, tag_id));
    }

    pub fn like(&self, post_id: Uuid, user_id: Uuid) {
        self.store().likes.push((post_id, user_id));
    }

    pub fn add_comment(&self, post_id: Uuid, author_id: Uuid, text: &str, at: OffsetDateTime) {
        self.store().comments.push(CommentRecord {
            id: Uuid::new_v4(),
            text: text.to_string(),
            published_at: at,
            author_id,
            post_id,
        });
    }

    pub fn post(&self, id: Uuid) -> Option<PostRecord> {
        self.store().posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn set_image(&self, id: Uuid, image: &str) {
        if let Some(post) = self.store().posts.iter_mut().find(|p| p.id == id) {
            post.image = Some(image.to_string());
        }
    }

    pub fn post_count(&self) -> usize {
        self.store().posts.len()
    }
}

#[async_trait]
impl PostsRepo for MemoryRepo {
    async fn list_popular(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let mut rows = self.store().summaries_newest_first();
        rows.sort_by(|a, b| b.likes_count.cmp(&a.likes_count));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_fresh(&self, limit: u32) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let mut rows = self.store().summaries_newest_first();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_for_tag(
        &self,
        tag_id: Uuid,
        limit: u32,
    ) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let store = self.store();
        let mut rows: Vec<_> = store
            .summaries_newest_first()
            .into_iter()
            .filter(|row| store.post_tags.contains(&(row.post.id, tag_id)))
            .collect();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn find_summary_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<PostSummaryRecord>, RepoError> {
        let store = self.store();
        Ok(store
            .posts
            .iter()
            .find(|post| post.slug == slug)
            .map(|post| store.summary(post)))
    }

    async fn find_summary_by_id(&self, id: Uuid) -> Result<Option<PostSummaryRecord>, RepoError> {
        let store = self.store();
        Ok(store
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| store.summary(post)))
    }

    async fn list_all(&self) -> Result<Vec<PostSummaryRecord>, RepoError> {
        Ok(self.store().summaries_newest_first())
    }

    async fn list_like_user_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let mut ids: Vec<Uuid> = self
            .store()
            .likes
            .iter()
            .filter(|(p, _)| *p == post_id)
            .map(|(_, u)| *u)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self.store().posts.iter().any(|post| post.slug == slug))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut store = self.store();
        if store.posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            text: params.text,
            image: None,
            published_at: params.published_at,
            slug: params.slug,
            author_id: params.author_id,
        };
        for tag_id in params.tag_ids {
            store.post_tags.push((post.id, tag_id));
        }
        for user_id in params.like_user_ids {
            store.likes.push((post.id, user_id));
        }
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut store = self.store();
        if store
            .posts
            .iter()
            .any(|post| post.slug == params.slug && post.id != params.id)
        {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }
        let post = store
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.text = params.text;
        post.slug = params.slug;
        post.author_id = params.author_id;
        post.published_at = params.published_at;
        Ok(post.clone())
    }

    async fn update_post_image(
        &self,
        id: Uuid,
        image: Option<String>,
    ) -> Result<PostRecord, RepoError> {
        let mut store = self.store();
        let post = store
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.image = image;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store();
        let before = store.posts.len();
        store.posts.retain(|post| post.id != id);
        if store.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        store.post_tags.retain(|(p, _)| *p != id);
        store.likes.retain(|(p, _)| *p != id);
        store.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut store = self.store();
        store.post_tags.retain(|(p, _)| *p != post_id);
        store
            .post_tags
            .extend(tag_ids.iter().map(|tag_id| (post_id, *tag_id)));
        Ok(())
    }

    async fn replace_post_likes(
        &self,
        post_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), RepoError> {
        let mut store = self.store();
        store.likes.retain(|(p, _)| *p != post_id);
        store
            .likes
            .extend(user_ids.iter().map(|user_id| (post_id, *user_id)));
        Ok(())
    }
}

#[async_trait]
impl TagsRepo for MemoryRepo {
    async fn list_popular(&self, limit: u32) -> Result<Vec<TagWithCount>, RepoError> {
        let mut rows = self.store().tag_counts();
        rows.sort_by(|a, b| {
            b.posts_count
                .cmp(&a.posts_count)
                .then(a.title.cmp(&b.title))
                .then(a.id.cmp(&b.id))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, RepoError> {
        let mut rows = self.store().tag_counts();
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        Ok(self.store().tags_of(post_id))
    }

    async fn list_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagRecord>>, RepoError> {
        let store = self.store();
        Ok(post_ids
            .iter()
            .map(|id| (*id, store.tags_of(*id)))
            .filter(|(_, tags)| !tags.is_empty())
            .collect())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<TagRecord>, RepoError> {
        Ok(self
            .store()
            .tags
            .iter()
            .find(|tag| tag.title == title)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        Ok(self.store().tags.iter().find(|tag| tag.id == id).cloned())
    }
}

#[async_trait]
impl TagsWriteRepo for MemoryRepo {
    async fn create_tag(&self, title: &str) -> Result<TagRecord, RepoError> {
        let mut store = self.store();
        if store.tags.iter().any(|tag| tag.title == title) {
            return Err(RepoError::Duplicate {
                constraint: "tags_title_key".to_string(),
            });
        }
        let tag = TagRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
        };
        store.tags.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: Uuid, title: &str) -> Result<TagRecord, RepoError> {
        let mut store = self.store();
        if store.tags.iter().any(|tag| tag.title == title && tag.id != id) {
            return Err(RepoError::Duplicate {
                constraint: "tags_title_key".to_string(),
            });
        }
        let tag = store
            .tags
            .iter_mut()
            .find(|tag| tag.id == id)
            .ok_or(RepoError::NotFound)?;
        tag.title = title.to_string();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store();
        let before = store.tags.len();
        store.tags.retain(|tag| tag.id != id);
        if store.tags.len() == before {
            return Err(RepoError::NotFound);
        }
        store.post_tags.retain(|(_, t)| *t != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepo {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let store = self.store();
        let mut rows: Vec<_> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentWithAuthor {
                comment: c.clone(),
                author_username: store.username(c.author_id),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.comment
                .published_at
                .cmp(&b.comment.published_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(rows)
    }

    async fn list_admin(&self) -> Result<Vec<AdminCommentRecord>, RepoError> {
        let store = self.store();
        let mut rows: Vec<_> = store
            .comments
            .iter()
            .map(|c| AdminCommentRecord {
                comment: c.clone(),
                author_username: store.username(c.author_id),
                post_title: store
                    .posts
                    .iter()
                    .find(|p| p.id == c.post_id)
                    .map(|p| p.title.clone())
                    .unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.comment
                .published_at
                .cmp(&a.comment.published_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(rows)
    }
}

#[async_trait]
impl CommentsWriteRepo for MemoryRepo {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            text: params.text,
            published_at: params.published_at,
            author_id: params.author_id,
            post_id: params.post_id,
        };
        self.store().comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store();
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        if store.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UsersRepo for MemoryRepo {
    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError> {
        let mut users = self.store().users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.store().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UsersWriteRepo for MemoryRepo {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError> {
        let mut store = self.store();
        if store.users.iter().any(|user| user.username == username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        store.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl HealthRepo for MemoryRepo {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.fail_health {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

pub fn base_time() -> OffsetDateTime {
    datetime!(2024-03-01 09:00 UTC)
}

pub fn days_after(days: i64) -> OffsetDateTime {
    base_time() + Duration::days(days)
}

pub fn public_router(repo: Arc<MemoryRepo>, media_root: &Path) -> Router {
    let media = MediaStorage::new(media_root.to_path_buf()).expect("media storage");
    let state = HttpState {
        blog: Arc::new(BlogService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            MEDIA_PREFIX,
        )),
        chrome: LayoutChrome::for_site("Lectern"),
        media: Arc::new(media),
        media_url_prefix: MEDIA_PREFIX.to_string(),
        health: repo,
    };
    http::build_router(state)
}

pub fn admin_router(repo: Arc<MemoryRepo>, media_root: &Path) -> Router {
    let media = MediaStorage::new(media_root.to_path_buf()).expect("media storage");
    let state = AdminState {
        posts: Arc::new(AdminPostService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
        )),
        tags: Arc::new(AdminTagService::new(repo.clone(), repo.clone())),
        comments: Arc::new(AdminCommentService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
        )),
        users: Arc::new(AdminUserService::new(repo.clone(), repo.clone())),
        media: Arc::new(media),
        media_url_prefix: MEDIA_PREFIX.to_string(),
        max_upload_bytes: MAX_UPLOAD_BYTES,
        health: repo,
    };
    http::build_admin_router(state)
}
