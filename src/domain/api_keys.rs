//! Domain types for API keys.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle state of an API key, derived from its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
    Expired,
}

impl ApiKeyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl Display for ApiKeyStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored key. Each key authenticates as exactly one user id.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
}

impl ApiKeyRecord {
    /// Revocation wins over expiry when both apply.
    pub fn status_at(&self, now: OffsetDateTime) -> ApiKeyStatus {
        if let Some(revoked_at) = self.revoked_at
            && revoked_at <= now
        {
            return ApiKeyStatus::Revoked;
        }
        if let Some(expires_at) = self.expires_at
            && expires_at <= now
        {
            return ApiKeyStatus::Expired;
        }
        ApiKeyStatus::Active
    }
}
