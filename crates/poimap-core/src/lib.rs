//! Domain types and configuration shared by the `poimap` crates.

mod app_config;
mod config;
mod location;
mod type_id;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use location::{BoxBound, LngLat, Location, LocationType, SearchForm, TypeOption};
pub use type_id::{parse_type_id, TypeId, TypeIdError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
