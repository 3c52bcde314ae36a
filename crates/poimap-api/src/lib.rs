//! Typed HTTP client for the location backend's REST API.

mod client;
mod error;
mod query;
mod types;

pub use client::LocationApiClient;
pub use error::ApiError;
pub use query::{build_bound_query, build_search_query, LocationQuery};
pub use types::TypeCatalog;
