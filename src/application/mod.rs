pub mod api_keys;
pub mod error;
pub mod posts;
pub mod repos;
