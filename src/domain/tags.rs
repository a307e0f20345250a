//! Delimited-string tag encoding.
//!
//! Tags are persisted as a single comma-joined column. Every value written
//! goes through [`join_tags`] and every value read goes through
//! [`split_tags`], so callers only ever see `Vec<String>`.

use super::error::DomainError;

pub const TAG_DELIMITER: char = ',';

/// Reject tags that could not survive a join/split round trip.
pub fn validate_tags(tags: &[String]) -> Result<(), DomainError> {
    for (index, tag) in tags.iter().enumerate() {
        if tag.trim().is_empty() {
            return Err(DomainError::invalid(
                "tags",
                format!("tag at position {index} is empty"),
            ));
        }
        if tag.contains(TAG_DELIMITER) {
            return Err(DomainError::invalid(
                "tags",
                format!("tag `{tag}` contains the `{TAG_DELIMITER}` delimiter"),
            ));
        }
    }
    Ok(())
}

pub fn join_tags(tags: &[String]) -> String {
    let mut joined = String::new();
    for (index, tag) in tags.iter().enumerate() {
        if index > 0 {
            joined.push(TAG_DELIMITER);
        }
        joined.push_str(tag);
    }
    joined
}

/// An empty column means "no tags", not a single empty tag.
pub fn split_tags(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(TAG_DELIMITER).map(str::to_string).collect()
}
