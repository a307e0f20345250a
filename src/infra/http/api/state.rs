use std::sync::Arc;

use crate::application::api_keys::ApiKeyService;
use crate::application::posts::PostService;
use crate::application::repos::HealthRepo;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub api_keys: Arc<ApiKeyService>,
    pub health: Arc<dyn HealthRepo>,
}
