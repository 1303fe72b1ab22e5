//! Storage traits and error types
//!
//! This module defines the trait interface for project storage backends and
//! associated error types.

use crate::record::{CreatorProfile, ProjectRecord, ProjectState, StatusSnapshot};
use crate::storage::{CreatorTarget, ProjectUrl, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for project storage backends
///
/// The store is a document collection keyed by the platform identifier. It
/// supports point lookup by id, state-filtered projections, full-record
/// replacement, a partial creator patch, and an append to the snapshot
/// history. The reconciliation algorithm in [`crate::reconcile`] is written
/// against this trait only.
pub trait ProjectStore {
    // ===== Run Management =====

    /// Creates a new run row in `running` status and returns its id
    fn create_run(&mut self, mode: &str, config_hash: &str) -> StoreResult<i64>;

    /// Marks a run finished with the given terminal status
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StoreResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord>;

    // ===== Reconciliation Primitives =====

    /// Point lookup of the persisted lifecycle state for a project
    ///
    /// Returns None when the project has never been sighted.
    fn get_project_state(&self, id: i64) -> StoreResult<Option<ProjectState>>;

    /// Point lookup of the full persisted record
    fn get_project(&self, id: i64) -> StoreResult<Option<ProjectRecord>>;

    /// Inserts a record on first sighting
    fn insert_project(&mut self, record: &ProjectRecord) -> StoreResult<()>;

    /// Overwrites all top-level fields of an existing record
    ///
    /// The snapshot history is untouched.
    fn replace_project(&mut self, record: &ProjectRecord) -> StoreResult<()>;

    /// Appends one snapshot to a project's history
    fn append_snapshot(&mut self, project_id: i64, snapshot: &StatusSnapshot) -> StoreResult<()>;

    /// Appends a snapshot and overwrites the record's fields as one atomic pair
    ///
    /// The append executes before the overwrite, so the snapshot captures the
    /// sighting that is about to replace the stored fields. Both writes commit
    /// together or not at all.
    fn apply_live_update(
        &mut self,
        record: &ProjectRecord,
        snapshot: &StatusSnapshot,
    ) -> StoreResult<()>;

    /// Reads a project's snapshot history in append order
    fn snapshots(&self, project_id: i64) -> StoreResult<Vec<StatusSnapshot>>;

    // ===== Mode Projections =====

    /// Projects currently marked live, with their canonical URLs
    fn live_project_urls(&self) -> StoreResult<Vec<ProjectUrl>>;

    /// Projects that have a creator profile URL but no scraped counters yet
    fn projects_missing_creator_profile(&self) -> StoreResult<Vec<CreatorTarget>>;

    /// Patches only the creator counter fields onto an existing record
    ///
    /// Counters absent from the profile keep whatever value is stored.
    fn patch_creator_profile(
        &mut self,
        project_id: i64,
        profile: &CreatorProfile,
    ) -> StoreResult<()>;

    // ===== Statistics =====

    /// Gets total project count
    fn count_projects(&self) -> StoreResult<u64>;

    /// Counts projects in a given lifecycle state
    fn count_projects_by_state(&self, state: ProjectState) -> StoreResult<u64>;
}
