use std::sync::Arc;

use crate::application::repos::{PostsRepo, PostsWriteRepo, TagsRepo, UsersRepo};

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) tags: Arc<dyn TagsRepo>,
    pub(crate) users: Arc<dyn UsersRepo>,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        tags: Arc<dyn TagsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            tags,
            users,
        }
    }
}
