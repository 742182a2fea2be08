use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HireflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::tracker::PipelineError),

    #[error("Relay error: {0}")]
    Relay(#[from] crate::relay::RelayError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, HireflowError>;
