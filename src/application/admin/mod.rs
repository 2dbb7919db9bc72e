//! Application services for the administrative surface.

pub mod comments;
pub mod posts;
pub mod tags;
pub mod users;

use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;

pub use comments::AdminCommentService;
pub use posts::AdminPostService;
pub use tags::AdminTagService;
pub use users::AdminUserService;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    Validation(String),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Turn a repository `NotFound` into a not-found error for `entity`.
    pub(crate) fn from_repo(entity: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |err| match err {
            RepoError::NotFound => Self::not_found(entity),
            other => Self::Repo(other),
        }
    }
}

impl From<SlugError> for AdminError {
    fn from(err: SlugError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Drop repeated ids, keeping first-seen order.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[b, a, b, a]), vec![b, a]);
    }

    #[test]
    fn repo_not_found_is_renamed() {
        let err = AdminError::from_repo("tag")(RepoError::NotFound);
        assert_eq!(err.to_string(), "tag not found");

        let err = AdminError::from_repo("tag")(RepoError::Timeout);
        assert!(matches!(err, AdminError::Repo(RepoError::Timeout)));
    }
}
