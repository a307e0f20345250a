use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::posts::PostRecord;
use crate::domain::sort::{PostSort, SortField};

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::{POST_COLUMNS, PostRow, fetch_post_row};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_post_ids_by_authors(&self, author_ids: &[i64]) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT post_id FROM user_posts WHERE user_id = ANY($1) ORDER BY post_id",
        )
        .bind(author_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_posts_by_ids(
        &self,
        post_ids: &[i64],
        sort: PostSort,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE p.id = ANY(");
        qb.push_bind(post_ids.to_vec());
        qb.push(")");
        push_order_by(&mut qb, sort);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx_error)?;
        let row = fetch_post_row(&mut conn, id, false)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }
}

/// Column names come from the allow-listed enum only; `id` breaks ties.
fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: PostSort) {
    qb.push(" ORDER BY p.");
    qb.push(sort.field.column());
    qb.push(" ");
    qb.push(sort.direction.sql());
    if sort.field != SortField::Id {
        qb.push(", p.id ASC");
    }
}
