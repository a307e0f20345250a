//! Issuing and verifying the bearer tokens that identify callers.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ApiKeysRepo, CreateApiKeyParams, RepoError};
use crate::domain::api_keys::{ApiKeyRecord, ApiKeyStatus};

const TOKEN_TAG: &str = "pb";
const PREFIX_LEN: usize = 12;
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("key name must not be empty")]
    EmptyName,
    #[error("user id must be a positive integer")]
    InvalidUser,
    #[error("key not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum ApiAuthError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("missing api key")]
    Missing,
    #[error("invalid api key")]
    Invalid,
    #[error("expired api key")]
    Expired,
    #[error("revoked api key")]
    Revoked,
}

#[derive(Debug, Clone)]
pub struct IssueApiKeyCommand {
    pub user_id: i64,
    pub name: String,
    pub expires_at: Option<OffsetDateTime>,
}

/// Returned once at issue time; the plain token is never stored.
#[derive(Debug, Clone)]
pub struct ApiKeyIssued {
    pub record: ApiKeyRecord,
    pub token: String,
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub key_id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub prefix: String,
}

#[derive(Clone)]
pub struct ApiKeyService {
    repo: Arc<dyn ApiKeysRepo>,
}

impl ApiKeyService {
    pub fn new(repo: Arc<dyn ApiKeysRepo>) -> Self {
        Self { repo }
    }

    pub async fn issue(&self, cmd: IssueApiKeyCommand) -> Result<ApiKeyIssued, ApiKeyError> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(ApiKeyError::EmptyName);
        }
        if cmd.user_id <= 0 {
            return Err(ApiKeyError::InvalidUser);
        }

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{TOKEN_TAG}_{prefix}_{secret}");

        let record = self
            .repo
            .create_key(CreateApiKeyParams {
                user_id: cmd.user_id,
                name: name.to_string(),
                prefix,
                hashed_secret: hash_secret(&secret),
                expires_at: cmd.expires_at,
            })
            .await?;

        Ok(ApiKeyIssued { record, token })
    }

    pub async fn revoke(&self, id: Uuid) -> Result<(), ApiKeyError> {
        match self.repo.revoke_key(id, OffsetDateTime::now_utc()).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(ApiKeyError::NotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn list(&self) -> Result<Vec<ApiKeyRecord>, ApiKeyError> {
        self.repo.list_keys().await.map_err(ApiKeyError::from)
    }

    pub async fn authenticate(&self, token: &str) -> Result<Caller, ApiAuthError> {
        let parsed = parse_token(token).ok_or(ApiAuthError::Invalid)?;
        let record = self
            .repo
            .find_by_prefix(parsed.prefix)
            .await?
            .ok_or(ApiAuthError::Invalid)?;

        let hashed_input = hash_secret(parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(ApiAuthError::Invalid);
        }

        let now = OffsetDateTime::now_utc();
        match record.status_at(now) {
            ApiKeyStatus::Active => {}
            ApiKeyStatus::Revoked => return Err(ApiAuthError::Revoked),
            ApiKeyStatus::Expired => return Err(ApiAuthError::Expired),
        }

        // last_used_at is advisory; authentication does not wait for it
        let repo = self.repo.clone();
        let key_id = record.id;
        tokio::spawn(async move {
            if let Err(err) = repo.update_last_used(key_id, now).await {
                tracing::debug!(error = %err, %key_id, "Failed to record API key use");
            }
        });

        Ok(Caller {
            key_id: record.id,
            user_id: record.user_id,
            name: record.name,
            prefix: record.prefix,
        })
    }
}

fn hash_secret(secret: &str) -> Vec<u8> {
    Sha256::digest(secret.as_bytes()).to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..PREFIX_LEN].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

struct ParsedToken<'a> {
    prefix: &'a str,
    secret: &'a str,
}

fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
    let mut parts = token.trim().splitn(3, '_');
    if parts.next()? != TOKEN_TAG {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
        return None;
    }
    Some(ParsedToken { prefix, secret })
}
