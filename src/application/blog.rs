//! Public blog pages: index, post detail, tag filter and contacts.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, PostSummaryRecord, PostsRepo, RepoError, TagWithCount,
    TagsRepo,
};
use crate::domain::entities::TagRecord;
use crate::domain::posts;
use crate::presentation::views::{
    self, CommentView, ContactsView, IndexView, PostCard, PostDetailView, SidebarView, TagFilterView,
    TagLink, TagSummary,
};

pub const POPULAR_POSTS_LIMIT: u32 = 5;
pub const FRESH_POSTS_LIMIT: u32 = 5;
pub const POPULAR_TAGS_LIMIT: u32 = 5;
pub const TAG_POSTS_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostsRepo>,
    tags: Arc<dyn TagsRepo>,
    comments: Arc<dyn CommentsRepo>,
    media_url_prefix: String,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        tags: Arc<dyn TagsRepo>,
        comments: Arc<dyn CommentsRepo>,
        media_url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            tags,
            comments,
            media_url_prefix: media_url_prefix.into(),
        }
    }

    pub async fn index(&self) -> Result<IndexView, BlogError> {
        let sidebar = self.sidebar().await?;
        let fresh = self.posts.list_fresh(FRESH_POSTS_LIMIT).await?;
        let page_posts = self.build_cards(fresh).await?;

        Ok(IndexView {
            page_posts,
            sidebar,
        })
    }

    /// `Ok(None)` when no post carries `slug`.
    pub async fn post_detail(&self, slug: &str) -> Result<Option<PostDetailView>, BlogError> {
        let Some(summary) = self.posts.find_summary_by_slug(slug).await? else {
            return Ok(None);
        };

        let tags = self.tags.list_for_post(summary.post.id).await?;
        let comments = self.comments.list_for_post(summary.post.id).await?;
        let sidebar = self.sidebar().await?;

        let PostSummaryRecord {
            post,
            author_username,
            likes_count,
            ..
        } = summary;

        Ok(Some(PostDetailView {
            image_url: self.image_url(post.image.as_deref()),
            published: posts::format_human_date(post.published_at),
            iso_date: posts::format_iso_datetime(post.published_at),
            title: post.title,
            text: post.text,
            author: author_username,
            comments: comments.into_iter().map(build_comment_view).collect(),
            likes_amount: likes_count,
            slug: post.slug,
            tags: build_tag_links(&tags),
            sidebar,
        }))
    }

    /// `Ok(None)` when no tag is titled `title`.
    pub async fn tag_filter(&self, title: &str) -> Result<Option<TagFilterView>, BlogError> {
        let Some(tag) = self.tags.find_by_title(title).await? else {
            return Ok(None);
        };

        let records = self.posts.list_for_tag(tag.id, TAG_POSTS_LIMIT).await?;
        let posts = self.build_cards(records).await?;
        let sidebar = self.sidebar().await?;

        Ok(Some(TagFilterView {
            tag: tag.title,
            posts,
            sidebar,
        }))
    }

    pub fn contacts(&self) -> ContactsView {
        ContactsView
    }

    async fn sidebar(&self) -> Result<SidebarView, BlogError> {
        let popular = self.posts.list_popular(POPULAR_POSTS_LIMIT).await?;
        let most_popular_posts = self.build_cards(popular).await?;
        let popular_tags = self
            .tags
            .list_popular(POPULAR_TAGS_LIMIT)
            .await?
            .into_iter()
            .map(build_tag_summary)
            .collect();

        Ok(SidebarView {
            most_popular_posts,
            popular_tags,
        })
    }

    async fn build_cards(
        &self,
        records: Vec<PostSummaryRecord>,
    ) -> Result<Vec<PostCard>, BlogError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = records.iter().map(|record| record.post.id).collect();
        let mut tags_by_post = self.tags.list_for_posts(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let tags = tags_by_post.remove(&record.post.id).unwrap_or_default();
                self.build_card(record, &tags)
            })
            .collect())
    }

    fn build_card(&self, record: PostSummaryRecord, tags: &[TagRecord]) -> PostCard {
        let PostSummaryRecord {
            post,
            author_username,
            comments_count,
            ..
        } = record;

        PostCard {
            teaser_text: posts::teaser(&post.text),
            image_url: self.image_url(post.image.as_deref()),
            published: posts::format_human_date(post.published_at),
            iso_date: posts::format_iso_datetime(post.published_at),
            href: views::post_path(&post.slug),
            title: post.title,
            author: author_username,
            comments_amount: comments_count,
            slug: post.slug,
            tags: build_tag_links(tags),
            first_tag_title: tags.first().map(|tag| tag.title.clone()),
        }
    }

    fn image_url(&self, image: Option<&str>) -> Option<String> {
        image
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", self.media_url_prefix, path.trim_start_matches('/')))
    }
}

fn build_tag_links(tags: &[TagRecord]) -> Vec<TagLink> {
    tags.iter()
        .map(|tag| TagLink {
            title: tag.title.clone(),
            href: views::tag_path(&tag.title),
        })
        .collect()
}

fn build_tag_summary(tag: TagWithCount) -> TagSummary {
    TagSummary {
        href: views::tag_path(&tag.title),
        title: tag.title,
        posts_with_tag: tag.posts_count,
    }
}

fn build_comment_view(entry: CommentWithAuthor) -> CommentView {
    CommentView {
        published: posts::format_human_date(entry.comment.published_at),
        iso_date: posts::format_iso_datetime(entry.comment.published_at),
        text: entry.comment.text,
        author: entry.author_username,
    }
}
