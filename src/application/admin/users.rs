use std::sync::Arc;

use crate::application::admin::AdminError;
use crate::application::repos::{UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserRecord;
use crate::domain::posts::require_text;

#[derive(Clone)]
pub struct AdminUserService {
    reader: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
}

impl AdminUserService {
    pub fn new(reader: Arc<dyn UsersRepo>, writer: Arc<dyn UsersWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, AdminError> {
        self.reader.list_all().await.map_err(AdminError::from)
    }

    pub async fn create(&self, username: &str) -> Result<UserRecord, AdminError> {
        let username = require_text("username", username)?;
        self.writer
            .create_user(&username)
            .await
            .map_err(AdminError::from)
    }
}
