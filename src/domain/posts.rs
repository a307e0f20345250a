//! Post entity and the rules for creating and patching it.

use serde::Serialize;

use super::authors::validate_author_ids;
use super::error::DomainError;
use super::tags::validate_tags;

/// A post as returned to callers. `tags` is always the split list form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    pub tags: Vec<String>,
    pub likes: i32,
    pub popularity: i32,
    pub reads: i32,
    /// Linked user ids, ascending.
    pub author_ids: Vec<i64>,
}

/// Validated input for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    text: String,
    tags: Vec<String>,
}

impl NewPost {
    pub fn new(text: Option<String>, tags: Option<Vec<String>>) -> Result<Self, DomainError> {
        let text = text.ok_or_else(|| DomainError::missing("text"))?;
        ensure_text(&text)?;
        let tags = tags.unwrap_or_default();
        validate_tags(&tags)?;
        Ok(Self { text, tags })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.text, self.tags)
    }
}

/// Validated partial update. `None` leaves the stored attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    text: Option<String>,
    tags: Option<Vec<String>>,
    author_ids: Option<Vec<i64>>,
}

impl PostChanges {
    pub fn new(
        text: Option<String>,
        tags: Option<Vec<String>>,
        author_ids: Option<Vec<i64>>,
    ) -> Result<Self, DomainError> {
        if let Some(text) = text.as_deref() {
            ensure_text(text)?;
        }
        if let Some(tags) = tags.as_deref() {
            validate_tags(tags)?;
        }
        let author_ids = match author_ids {
            Some(ids) => {
                validate_author_ids(&ids)?;
                Some(normalize_author_ids(ids))
            }
            None => None,
        };
        Ok(Self {
            text,
            tags,
            author_ids,
        })
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    pub fn author_ids(&self) -> Option<&[i64]> {
        self.author_ids.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tags.is_none() && self.author_ids.is_none()
    }

    /// Names of the provided fields, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(3);
        if self.author_ids.is_some() {
            fields.push("authorIds");
        }
        if self.text.is_some() {
            fields.push("text");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }
}

impl PostRecord {
    /// Overwrite every provided attribute, field by field.
    pub fn merged(mut self, changes: PostChanges) -> Self {
        let PostChanges {
            text,
            tags,
            author_ids,
        } = changes;

        if let Some(text) = text {
            self.text = text;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if let Some(author_ids) = author_ids {
            self.author_ids = author_ids;
        }
        self
    }
}

pub fn normalize_author_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn ensure_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::invalid("text", "must not be empty"));
    }
    Ok(())
}
