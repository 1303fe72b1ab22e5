//! Storage module for persisting scraped projects
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Project upserts and the append-only snapshot history
//! - Creator profile patches
//! - Run bookkeeping (completed vs aborted)

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{ProjectStore, StoreError, StoreResult};

use crate::PledgeError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(PledgeError)` - Failed to open the database (fatal at startup)
pub fn open_store(path: &Path) -> Result<SqliteStore, PledgeError> {
    SqliteStore::new(path)
}

/// A project id / canonical URL pair, projected for the refresh pass
#[derive(Debug, Clone)]
pub struct ProjectUrl {
    pub id: i64,
    pub url: String,
}

/// A project still lacking creator counters, projected for enrichment
#[derive(Debug, Clone)]
pub struct CreatorTarget {
    pub id: i64,
    pub slug: Option<String>,
    pub profile_url: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub mode: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Aborted] {
            let db_str = status.to_db_string();
            assert_eq!(Some(*status), RunStatus::from_db_string(db_str));
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }
}
