use sqlx::PgConnection;

use crate::domain::posts::PostRecord;
use crate::domain::tags::split_tags;

/// Public post columns plus the ascending authorship list, read from `posts p`.
pub(super) const POST_COLUMNS: &str = "p.id, p.text, p.tags, p.likes, p.popularity, p.reads, \
    ARRAY(SELECT up.user_id FROM user_posts up WHERE up.post_id = p.id ORDER BY up.user_id) \
    AS author_ids";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PostRow {
    pub id: i64,
    pub text: String,
    pub tags: String,
    pub likes: i32,
    pub popularity: i32,
    pub reads: i32,
    pub author_ids: Vec<i64>,
}

// Every read path converts through here, so stored tags are always split.
impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            tags: split_tags(&row.tags),
            likes: row.likes,
            popularity: row.popularity,
            reads: row.reads,
            author_ids: row.author_ids,
        }
    }
}

pub(super) async fn fetch_post_row(
    conn: &mut PgConnection,
    id: i64,
    for_update: bool,
) -> Result<Option<PostRow>, sqlx::Error> {
    let lock = if for_update { " FOR UPDATE OF p" } else { "" };
    let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1{lock}");
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}
