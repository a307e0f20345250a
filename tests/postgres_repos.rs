//! Adapter tests against a real Postgres. Run with `DATABASE_URL` set and
//! `cargo test -- --ignored`.

use postboard::application::repos::{
    ApiKeysRepo, CreateApiKeyParams, CreatePostParams, HealthRepo, PatchPostParams, PostsRepo,
    PostsWriteRepo, RepoError,
};
use postboard::domain::posts::PostChanges;
use postboard::domain::sort::{PostSort, SortDirection, SortField};
use postboard::infra::db::PostgresRepositories;
use sqlx::PgPool;
use time::OffsetDateTime;

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

async fn stored_tags(pool: &PgPool, id: i64) -> String {
    sqlx::query_scalar::<_, String>("SELECT tags FROM posts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("stored tags")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_writes_post_and_link_together(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());

    let post = repos
        .create_post(CreatePostParams {
            author_id: 11,
            text: "hello".to_string(),
            tags: tags(&["tech", "health"]),
        })
        .await
        .expect("create post");

    assert_eq!(post.author_ids, vec![11]);
    assert_eq!(post.tags, tags(&["tech", "health"]));
    assert_eq!(stored_tags(&pool, post.id).await, "tech,health");

    let links = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_posts WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(&pool)
        .await
        .expect("count links");
    assert_eq!(links, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_filters_by_author_and_sorts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());

    let mut ids = Vec::new();
    for (author, likes) in [(1_i64, 5_i32), (1, 9), (2, 9), (3, 1)] {
        let post = repos
            .create_post(CreatePostParams {
                author_id: author,
                text: format!("by {author}"),
                tags: Vec::new(),
            })
            .await
            .expect("create post");
        sqlx::query("UPDATE posts SET likes = $2 WHERE id = $1")
            .bind(post.id)
            .bind(likes)
            .execute(&pool)
            .await
            .expect("set likes");
        ids.push(post.id);
    }

    let post_ids = repos
        .list_post_ids_by_authors(&[1, 2])
        .await
        .expect("post ids");
    assert_eq!(post_ids, ids[..3].to_vec());

    let sort = PostSort {
        field: SortField::Likes,
        direction: SortDirection::Desc,
    };
    let posts = repos
        .list_posts_by_ids(&post_ids, sort)
        .await
        .expect("posts");
    let listed: Vec<i64> = posts.iter().map(|post| post.id).collect();
    assert_eq!(listed, vec![ids[1], ids[2], ids[0]]);
    assert!(posts.iter().all(|post| post.tags.is_empty()));

    assert!(
        repos
            .list_post_ids_by_authors(&[404])
            .await
            .expect("no ids")
            .is_empty()
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn patch_merges_fields_and_replaces_links(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());
    let post = repos
        .create_post(CreatePostParams {
            author_id: 1,
            text: "before".to_string(),
            tags: tags(&["old"]),
        })
        .await
        .expect("create post");

    let changes = PostChanges::new(None, Some(tags(&["travel", "food"])), Some(vec![4, 2]))
        .expect("valid changes");
    let patched = repos
        .patch_post(PatchPostParams {
            id: post.id,
            changes,
        })
        .await
        .expect("patch post");

    assert_eq!(patched.text, "before");
    assert_eq!(patched.tags, tags(&["travel", "food"]));
    assert_eq!(patched.author_ids, vec![2, 4]);
    assert_eq!(stored_tags(&pool, post.id).await, "travel,food");

    let reread = repos
        .find_by_id(post.id)
        .await
        .expect("find")
        .expect("post exists");
    assert_eq!(reread, patched);

    let missing = repos
        .patch_post(PatchPostParams {
            id: post.id + 1000,
            changes: PostChanges::new(Some("x".to_string()), None, None).expect("valid"),
        })
        .await;
    assert!(matches!(missing, Err(RepoError::NotFound)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn api_keys_round_trip_and_revoke(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    let params = CreateApiKeyParams {
        user_id: 5,
        name: "ci".to_string(),
        prefix: "abc123def456".to_string(),
        hashed_secret: vec![1, 2, 3],
        expires_at: None,
    };
    let created = repos.create_key(params.clone()).await.expect("create key");
    assert_eq!(created.user_id, 5);

    let duplicate = repos.create_key(params).await;
    assert!(matches!(duplicate, Err(RepoError::Duplicate { .. })));

    let found = repos
        .find_by_prefix("abc123def456")
        .await
        .expect("lookup")
        .expect("key exists");
    assert_eq!(found.id, created.id);

    let now = OffsetDateTime::now_utc();
    repos.revoke_key(created.id, now).await.expect("revoke");
    let revoked = repos
        .find_by_prefix("abc123def456")
        .await
        .expect("lookup")
        .expect("key exists");
    assert!(revoked.revoked_at.is_some());

    let unknown = repos.revoke_key(uuid::Uuid::new_v4(), now).await;
    assert!(matches!(unknown, Err(RepoError::NotFound)));

    repos.ping().await.expect("database reachable");
}
