#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use postboard::application::api_keys::{ApiKeyService, IssueApiKeyCommand};
use postboard::application::posts::PostService;
use postboard::application::repos::{
    ApiKeysRepo, CreateApiKeyParams, CreatePostParams, HealthRepo, PatchPostParams, PostsRepo,
    PostsWriteRepo, RepoError,
};
use postboard::domain::api_keys::ApiKeyRecord;
use postboard::domain::posts::PostRecord;
use postboard::domain::sort::{PostSort, SortDirection, SortField};
use postboard::domain::tags::{join_tags, split_tags};
use postboard::infra::http::{ApiState, build_router};

/// Row shape as the database holds it: tags stay joined.
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub id: i64,
    pub text: String,
    pub tags: String,
    pub likes: i32,
    pub popularity: i32,
    pub reads: i32,
}

#[derive(Default)]
struct PostTables {
    next_id: i64,
    posts: BTreeMap<i64, StoredPost>,
    /// (user_id, post_id)
    links: BTreeSet<(i64, i64)>,
}

impl PostTables {
    fn record(&self, id: i64) -> Option<PostRecord> {
        let stored = self.posts.get(&id)?;
        let author_ids = self
            .links
            .iter()
            .filter(|(_, post_id)| *post_id == id)
            .map(|(user_id, _)| *user_id)
            .collect();
        Some(PostRecord {
            id: stored.id,
            text: stored.text.clone(),
            tags: split_tags(&stored.tags),
            likes: stored.likes,
            popularity: stored.popularity,
            reads: stored.reads,
            author_ids,
        })
    }
}

#[derive(Default)]
pub struct InMemoryPosts {
    tables: Mutex<PostTables>,
    fail_reads: AtomicBool,
    lookups_by_ids: AtomicUsize,
}

impl InMemoryPosts {
    pub async fn seed(
        &self,
        text: &str,
        tags: &[&str],
        counters: (i32, i32, i32),
        authors: &[i64],
    ) -> i64 {
        let (likes, popularity, reads) = counters;
        let mut tables = self.tables.lock().await;
        tables.next_id += 1;
        let id = tables.next_id;
        let tags: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
        tables.posts.insert(
            id,
            StoredPost {
                id,
                text: text.to_string(),
                tags: join_tags(&tags),
                likes,
                popularity,
                reads,
            },
        );
        for author in authors {
            tables.links.insert((*author, id));
        }
        id
    }

    pub async fn stored(&self, id: i64) -> Option<StoredPost> {
        self.tables.lock().await.posts.get(&id).cloned()
    }

    pub async fn authors_of(&self, id: i64) -> Vec<i64> {
        let tables = self.tables.lock().await;
        tables
            .links
            .iter()
            .filter(|(_, post_id)| *post_id == id)
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    pub async fn post_count(&self) -> usize {
        self.tables.lock().await.posts.len()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn lookups_by_ids(&self) -> usize {
        self.lookups_by_ids.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for InMemoryPosts {
    async fn list_post_ids_by_authors(&self, author_ids: &[i64]) -> Result<Vec<i64>, RepoError> {
        self.check_reads()?;
        let tables = self.tables.lock().await;
        let ids: BTreeSet<i64> = tables
            .links
            .iter()
            .filter(|(user_id, _)| author_ids.contains(user_id))
            .map(|(_, post_id)| *post_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn list_posts_by_ids(
        &self,
        post_ids: &[i64],
        sort: PostSort,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.check_reads()?;
        self.lookups_by_ids.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().await;
        let mut records: Vec<PostRecord> =
            post_ids.iter().filter_map(|id| tables.record(*id)).collect();
        records.sort_by(|a, b| {
            let key = |post: &PostRecord| match sort.field {
                SortField::Id => post.id,
                SortField::Reads => i64::from(post.reads),
                SortField::Likes => i64::from(post.likes),
                SortField::Popularity => i64::from(post.popularity),
            };
            let primary = match sort.direction {
                SortDirection::Asc => key(a).cmp(&key(b)),
                SortDirection::Desc => key(b).cmp(&key(a)),
            };
            primary.then(a.id.cmp(&b.id))
        });
        Ok(records)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.check_reads()?;
        Ok(self.tables.lock().await.record(id))
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryPosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        tables.next_id += 1;
        let id = tables.next_id;
        tables.posts.insert(
            id,
            StoredPost {
                id,
                text: params.text,
                tags: join_tags(&params.tags),
                likes: 0,
                popularity: 0,
                reads: 0,
            },
        );
        tables.links.insert((params.author_id, id));
        tables.record(id).ok_or(RepoError::NotFound)
    }

    async fn patch_post(&self, params: PatchPostParams) -> Result<PostRecord, RepoError> {
        let PatchPostParams { id, changes } = params;
        let mut tables = self.tables.lock().await;
        let current = tables.record(id).ok_or(RepoError::NotFound)?;
        let merged = current.merged(changes);

        if let Some(stored) = tables.posts.get_mut(&id) {
            stored.text = merged.text.clone();
            stored.tags = join_tags(&merged.tags);
        }
        tables.links.retain(|(_, post_id)| *post_id != id);
        for author in &merged.author_ids {
            tables.links.insert((*author, id));
        }
        tables.record(id).ok_or(RepoError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryApiKeys {
    keys: Mutex<Vec<ApiKeyRecord>>,
    fail_lookups: AtomicBool,
}

impl InMemoryApiKeys {
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApiKeysRepo for InMemoryApiKeys {
    async fn create_key(&self, params: CreateApiKeyParams) -> Result<ApiKeyRecord, RepoError> {
        let mut keys = self.keys.lock().await;
        if keys.iter().any(|key| key.prefix == params.prefix) {
            return Err(RepoError::Duplicate {
                constraint: "api_keys_prefix_key".to_string(),
            });
        }
        let record = ApiKeyRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            name: params.name,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            created_at: OffsetDateTime::now_utc(),
            expires_at: params.expires_at,
            revoked_at: None,
            last_used_at: None,
        };
        keys.push(record.clone());
        Ok(record)
    }

    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>, RepoError> {
        Ok(self.keys.lock().await.clone())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKeyRecord>, RepoError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection refused".to_string()));
        }
        let keys = self.keys.lock().await;
        Ok(keys.iter().find(|key| key.prefix == prefix).cloned())
    }

    async fn revoke_key(&self, id: Uuid, revoked_at: OffsetDateTime) -> Result<(), RepoError> {
        let mut keys = self.keys.lock().await;
        let key = keys
            .iter_mut()
            .find(|key| key.id == id)
            .ok_or(RepoError::NotFound)?;
        key.revoked_at.get_or_insert(revoked_at);
        Ok(())
    }

    async fn update_last_used(&self, id: Uuid, used_at: OffsetDateTime) -> Result<(), RepoError> {
        let mut keys = self.keys.lock().await;
        if let Some(key) = keys.iter_mut().find(|key| key.id == id) {
            key.last_used_at = Some(used_at);
        }
        Ok(())
    }
}

pub struct ToggleHealth {
    healthy: AtomicBool,
}

impl Default for ToggleHealth {
    fn default() -> Self {
        Self {
            healthy: AtomicBool::new(true),
        }
    }
}

impl ToggleHealth {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthRepo for ToggleHealth {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub posts: Arc<InMemoryPosts>,
    pub api_keys: Arc<ApiKeyService>,
    pub key_store: Arc<InMemoryApiKeys>,
    pub health: Arc<ToggleHealth>,
}

impl TestApp {
    pub fn new() -> Self {
        let posts = Arc::new(InMemoryPosts::default());
        let key_store = Arc::new(InMemoryApiKeys::default());
        let api_keys = Arc::new(ApiKeyService::new(key_store.clone()));
        let health = Arc::new(ToggleHealth::default());

        let reader: Arc<dyn PostsRepo> = posts.clone();
        let writer: Arc<dyn PostsWriteRepo> = posts.clone();
        let state = ApiState {
            posts: Arc::new(PostService::new(reader, writer)),
            api_keys: api_keys.clone(),
            health: health.clone(),
        };

        Self {
            router: build_router(state),
            posts,
            api_keys,
            key_store,
            health,
        }
    }

    pub async fn token_for(&self, user_id: i64) -> String {
        self.issue(user_id, None).await
    }

    pub async fn issue(&self, user_id: i64, expires_at: Option<OffsetDateTime>) -> String {
        self.api_keys
            .issue(IssueApiKeyCommand {
                user_id,
                name: format!("user-{user_id}"),
                expires_at,
            })
            .await
            .expect("issue api key")
            .token
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body should be json")
        };
        (status, value)
    }
}
