use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PatchPostParams, PostsWriteRepo, RepoError};
use crate::domain::posts::PostRecord;
use crate::domain::tags::join_tags;

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::fetch_post_row;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            author_id,
            text,
            tags,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (text, tags) VALUES ($1, $2) RETURNING id",
        )
        .bind(&text)
        .bind(join_tags(&tags))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("INSERT INTO user_posts (user_id, post_id) VALUES ($1, $2)")
            .bind(author_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let row = fetch_post_row(&mut tx, id, false)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| RepoError::Integrity {
                message: format!("post {id} vanished inside its creating transaction"),
            })?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }

    async fn patch_post(&self, params: PatchPostParams) -> Result<PostRecord, RepoError> {
        let PatchPostParams { id, changes } = params;
        let replacement_authors = changes.author_ids().map(<[i64]>::to_vec);

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let current = fetch_post_row(&mut tx, id, true)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        let merged = PostRecord::from(current).merged(changes);

        sqlx::query("UPDATE posts SET text = $2, tags = $3, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(&merged.text)
            .bind(join_tags(&merged.tags))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Some(author_ids) = replacement_authors {
            sqlx::query("DELETE FROM user_posts WHERE post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            sqlx::query(
                "INSERT INTO user_posts (user_id, post_id) SELECT author_id, $2 FROM UNNEST($1::bigint[]) AS author_id",
            )
            .bind(&author_ids)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        let row = fetch_post_row(&mut tx, id, false)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(PostRecord::from(row))
    }
}
