use std::sync::Arc;

use uuid::Uuid;

use crate::application::admin::AdminError;
use crate::application::repos::{TagWithCount, TagsRepo, TagsWriteRepo};
use crate::domain::entities::TagRecord;
use crate::domain::posts::require_text;

#[derive(Clone)]
pub struct AdminTagService {
    reader: Arc<dyn TagsRepo>,
    writer: Arc<dyn TagsWriteRepo>,
}

impl AdminTagService {
    pub fn new(reader: Arc<dyn TagsRepo>, writer: Arc<dyn TagsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_with_counts(&self) -> Result<Vec<TagWithCount>, AdminError> {
        self.reader
            .list_with_counts()
            .await
            .map_err(AdminError::from)
    }

    pub async fn create_tag(&self, title: &str) -> Result<TagRecord, AdminError> {
        let title = require_text("title", title)?;
        self.writer
            .create_tag(&title)
            .await
            .map_err(AdminError::from)
    }

    pub async fn rename_tag(&self, id: Uuid, title: &str) -> Result<TagRecord, AdminError> {
        let title = require_text("title", title)?;
        self.writer
            .update_tag(id, &title)
            .await
            .map_err(AdminError::from_repo("tag"))
    }

    pub async fn delete_tag(&self, id: Uuid) -> Result<(), AdminError> {
        self.writer
            .delete_tag(id)
            .await
            .map_err(AdminError::from_repo("tag"))
    }
}
