//! Pledgewatch: an incremental crowdfunding crawl-and-reconcile pipeline
//!
//! This crate crawls a crowdfunding platform's public discovery feed and
//! per-project pages, normalizes the scraped records, and reconciles them
//! against a SQLite store so that repeated runs converge to an append-only
//! history of each project's funding trajectory.

pub mod config;
pub mod crawler;
pub mod reconcile;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for pledgewatch operations
#[derive(Debug, Error)]
pub enum PledgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Discovery feed failed: {0}")]
    Discovery(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Record error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while normalizing a raw feed document into a typed record
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Missing field in project document: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is not a valid timestamp: {value}")]
    BadTimestamp { field: &'static str, value: String },

    #[error("Field {field} is not a valid number: {value}")]
    BadNumber { field: &'static str, value: String },
}

/// Result type alias for pledgewatch operations
pub type Result<T> = std::result::Result<T, PledgeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{CreatorProfile, ProjectRecord, ProjectState, StatusSnapshot};
