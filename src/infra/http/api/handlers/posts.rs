//! Posts handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;

use crate::application::api_keys::Caller;
use crate::domain::authors::parse_author_ids;
use crate::domain::posts::{NewPost, PostChanges};
use crate::domain::sort::PostSort;

use super::{
    domain_to_api, json_rejection_to_api, parse_post_id, post_to_api, query_rejection_to_api,
};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let post = NewPost::new(payload.text, payload.tags).map_err(domain_to_api)?;

    let post = state
        .posts
        .create_post(caller.user_id, post)
        .await
        .map_err(post_to_api)?;

    Ok(Json(PostResponse { post }))
}

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(_caller): Extension<Caller>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(query_rejection_to_api)?;
    let author_ids = parse_author_ids(query.author_ids.as_deref()).map_err(domain_to_api)?;
    let sort = PostSort::parse(query.sort_by.as_deref(), query.direction.as_deref())
        .map_err(domain_to_api)?;

    let posts = state
        .posts
        .list_posts(&author_ids, sort)
        .await
        .map_err(post_to_api)?;

    Ok(Json(PostsResponse { posts }))
}

pub async fn patch_post(
    State(state): State<ApiState>,
    Extension(_caller): Extension<Caller>,
    Path(post_id): Path<String>,
    payload: Result<Json<PatchPostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_post_id(&post_id)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let changes = PostChanges::new(payload.text, payload.tags, payload.author_ids)
        .map_err(domain_to_api)?;

    let post = state
        .posts
        .patch_post(id, changes)
        .await
        .map_err(post_to_api)?;

    Ok(Json(PostResponse { post }))
}
