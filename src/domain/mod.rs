//! Domain layer types and invariants.

pub mod api_keys;
pub mod authors;
pub mod error;
pub mod posts;
pub mod sort;
pub mod tags;
