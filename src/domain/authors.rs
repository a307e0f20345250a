use std::collections::HashSet;

use super::error::DomainError;

/// Parse the comma-separated `authorIds` query value.
///
/// Whitespace around each id is ignored. Duplicates are dropped while
/// keeping first-seen order.
pub fn parse_author_ids(raw: Option<&str>) -> Result<Vec<i64>, DomainError> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return Err(DomainError::missing("authorIds"));
    };

    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    for part in raw.split(',') {
        let id = parse_author_id(part.trim())?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Validate ids supplied as a JSON array.
pub fn validate_author_ids(ids: &[i64]) -> Result<(), DomainError> {
    if ids.is_empty() {
        return Err(DomainError::invalid(
            "authorIds",
            "a post must keep at least one author",
        ));
    }
    if let Some(id) = ids.iter().find(|id| **id <= 0) {
        return Err(DomainError::invalid(
            "authorIds",
            format!("`{id}` is not a positive integer"),
        ));
    }
    Ok(())
}

fn parse_author_id(value: &str) -> Result<i64, DomainError> {
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DomainError::invalid(
            "authorIds",
            format!("`{value}` is not a positive integer"),
        )),
    }
}
