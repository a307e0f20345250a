//! API handlers and the shared error conversions they rely on.

mod posts;

pub use posts::*;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;

use crate::application::posts::PostServiceError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::invalid_input(message),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    ApiError::invalid_input(err.to_string())
}

pub(crate) fn post_to_api(err: PostServiceError) -> ApiError {
    match err {
        PostServiceError::InvalidInput(inner) => domain_to_api(inner),
        PostServiceError::NotFound(_) => ApiError::not_found("post not found"),
        PostServiceError::Repo(repo) => repo_to_api(repo),
    }
}

/// Oversized bodies keep axum's 413; everything else is a client input error.
pub(crate) fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Request body too large",
            Some(rejection.body_text()),
        );
    }
    ApiError::invalid_input(rejection.body_text())
}

pub(crate) fn query_rejection_to_api(rejection: QueryRejection) -> ApiError {
    ApiError::invalid_input(rejection.body_text())
}

/// Path ids are parsed by hand so that `abc` or `0` surface as `invalid_input`.
pub(crate) fn parse_post_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(domain_to_api(DomainError::invalid(
            "postId",
            format!("`{raw}` is not a positive integer"),
        ))),
    }
}
