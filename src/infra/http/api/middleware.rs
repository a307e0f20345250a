use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::api_keys::ApiAuthError;

use super::error::{ApiError, codes};
use super::handlers::repo_to_api;
use super::state::ApiState;

const API_KEY_HEADER: &str = "x-api-key";

/// Resolves the API key into a [`Caller`](crate::application::api_keys::Caller)
/// placed in request extensions. The caller is mirrored onto the response for
/// outer logging layers.
pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        return auth_error(ApiAuthError::Missing).into_response();
    };

    let caller = match state.api_keys.authenticate(&token).await {
        Ok(caller) => caller,
        Err(err) => return auth_error(err).into_response(),
    };

    request.extensions_mut().insert(caller.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(caller);
    response
}

fn auth_error(err: ApiAuthError) -> ApiError {
    match err {
        ApiAuthError::Repo(repo) => repo_to_api(repo),
        ApiAuthError::Missing | ApiAuthError::Invalid => ApiError::unauthorized(),
        ApiAuthError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::EXPIRED,
            "API key expired",
            None,
        ),
        ApiAuthError::Revoked => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::REVOKED,
            "API key revoked",
            None,
        ),
    }
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "));
    let token = bearer.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    })?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
