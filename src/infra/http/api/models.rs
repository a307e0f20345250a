//! Request and response bodies for the posts API.

use serde::{Deserialize, Serialize};

use crate::domain::posts::PostRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Every field is optional; `null` behaves like an absent field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchPostRequest {
    pub author_ids: Option<Vec<i64>>,
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Kept as raw strings so parse failures become domain errors with a field name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub author_ids: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostRecord,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_request_treats_null_as_absent() {
        let req: PatchPostRequest =
            serde_json::from_str(r#"{"text": null, "tags": ["a"]}"#).expect("valid patch");
        assert!(req.text.is_none());
        assert_eq!(req.tags, Some(vec!["a".to_string()]));
        assert!(req.author_ids.is_none());
    }

    #[test]
    fn patch_request_rejects_wrong_types_and_unknown_fields() {
        assert!(serde_json::from_str::<PatchPostRequest>(r#"{"text": 123}"#).is_err());
        assert!(serde_json::from_str::<PatchPostRequest>(r#"{"authorIds": ["1"]}"#).is_err());
        assert!(serde_json::from_str::<PatchPostRequest>(r#"{"likes": 5}"#).is_err());
    }

    #[test]
    fn create_request_accepts_missing_tags() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"text": "hello"}"#).expect("valid create");
        assert_eq!(req.text.as_deref(), Some("hello"));
        assert!(req.tags.is_none());
    }
}
