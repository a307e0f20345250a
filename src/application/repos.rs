//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::api_keys::ApiKeyRecord;
use crate::domain::posts::{PostChanges, PostRecord};
use crate::domain::sort::PostSort;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    /// Becomes the first authorship link.
    pub author_id: i64,
    pub text: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PatchPostParams {
    pub id: i64,
    pub changes: PostChanges,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Distinct ids of posts linked to any of `author_ids`.
    async fn list_post_ids_by_authors(&self, author_ids: &[i64]) -> Result<Vec<i64>, RepoError>;

    async fn list_posts_by_ids(
        &self,
        post_ids: &[i64],
        sort: PostSort,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Inserts the post and its authorship link atomically.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Locks the row, merges the changes and persists them in one unit.
    /// Returns [`RepoError::NotFound`] when the post does not exist.
    async fn patch_post(&self, params: PatchPostParams) -> Result<PostRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateApiKeyParams {
    pub user_id: i64,
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait ApiKeysRepo: Send + Sync {
    async fn create_key(&self, params: CreateApiKeyParams) -> Result<ApiKeyRecord, RepoError>;

    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKeyRecord>, RepoError>;

    async fn revoke_key(&self, id: Uuid, revoked_at: OffsetDateTime) -> Result<(), RepoError>;

    async fn update_last_used(&self, id: Uuid, used_at: OffsetDateTime) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Round-trips a trivial statement to the backing store.
    async fn ping(&self) -> Result<(), RepoError>;
}
