//! Post use cases: create, list by authors, and partial update.

use std::sync::Arc;

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::application::repos::{
    CreatePostParams, PatchPostParams, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::error::DomainError;
use crate::domain::posts::{NewPost, PostChanges, PostRecord};
use crate::domain::sort::PostSort;

pub const METRIC_POSTS_CREATED: &str = "postboard_posts_created_total";
pub const METRIC_POSTS_PATCHED: &str = "postboard_posts_patched_total";
pub const METRIC_POSTS_LISTED: &str = "postboard_posts_listed_total";
pub const METRIC_POSTS_LIST_SIZE: &str = "postboard_posts_list_size";

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error("post `{0}` not found")]
    NotFound(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    #[instrument(skip(self, post), fields(tag_count = post.tags().len()))]
    pub async fn create_post(
        &self,
        author_id: i64,
        post: NewPost,
    ) -> Result<PostRecord, PostServiceError> {
        let (text, tags) = post.into_parts();
        let created = self
            .writer
            .create_post(CreatePostParams {
                author_id,
                text,
                tags,
            })
            .await?;

        counter!(METRIC_POSTS_CREATED).increment(1);
        info!(
            target = "postboard::posts",
            post_id = created.id,
            author_id,
            "Post created"
        );
        Ok(created)
    }

    /// Posts linked to any of `author_ids`, ordered by `sort` with `id`
    /// ascending as the tie-breaker.
    #[instrument(skip(self, author_ids), fields(authors = author_ids.len(), sort_by = %sort.field, direction = %sort.direction))]
    pub async fn list_posts(
        &self,
        author_ids: &[i64],
        sort: PostSort,
    ) -> Result<Vec<PostRecord>, PostServiceError> {
        if author_ids.is_empty() {
            return Err(DomainError::missing("authorIds").into());
        }

        let post_ids = self.reader.list_post_ids_by_authors(author_ids).await?;
        let posts = if post_ids.is_empty() {
            Vec::new()
        } else {
            self.reader.list_posts_by_ids(&post_ids, sort).await?
        };

        counter!(METRIC_POSTS_LISTED).increment(1);
        histogram!(METRIC_POSTS_LIST_SIZE).record(posts.len() as f64);
        debug!(
            target = "postboard::posts",
            matched = post_ids.len(),
            returned = posts.len(),
            "Posts listed"
        );
        Ok(posts)
    }

    #[instrument(skip(self, changes), fields(fields = ?changes.field_names()))]
    pub async fn patch_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<PostRecord, PostServiceError> {
        if changes.is_empty() {
            return self
                .reader
                .find_by_id(id)
                .await?
                .ok_or(PostServiceError::NotFound(id));
        }

        let updated = self
            .writer
            .patch_post(PatchPostParams { id, changes })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => PostServiceError::NotFound(id),
                other => PostServiceError::Repo(other),
            })?;

        counter!(METRIC_POSTS_PATCHED).increment(1);
        info!(target = "postboard::posts", post_id = id, "Post patched");
        Ok(updated)
    }
}
