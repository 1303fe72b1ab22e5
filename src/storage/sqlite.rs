//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProjectStore
//! trait. Projects live in one row each with typed columns for the fields
//! the pipeline reasons about plus the full raw document as JSON text; the
//! snapshot history is a separate append-only table.

use crate::record::{
    CreatorProfile, CreatorRef, CreatorStat, ProjectRecord, ProjectState, StatusSnapshot,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProjectStore, StoreError, StoreResult};
use crate::storage::{CreatorTarget, ProjectUrl, RunRecord, RunStatus};
use crate::PledgeError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(PledgeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, PledgeError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, PledgeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

const PROJECT_COLUMNS: &str = "id, name, slug, blurb, state, state_changed, goal, pledged, \
     usd_pledged, static_usd_rate, backers_count, country, currency, created_at, launched_at, \
     deadline, state_changed_at, updated, project_url, creator_id, creator_name, creator_url, \
     creator_backed, creator_created, creator_comments, document";

fn parse_timestamp(idx: usize, row: &Row<'_>) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ProjectRecord> {
    let state_text: String = row.get(4)?;
    let document_text: String = row.get(25)?;
    let document = serde_json::from_str(&document_text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(25, Type::Text, Box::new(e)))?;

    let mut profile = CreatorProfile::new();
    if let Some(count) = row.get::<_, Option<i64>>(22)? {
        profile.insert(CreatorStat::Backed, count as u64);
    }
    if let Some(count) = row.get::<_, Option<i64>>(23)? {
        profile.insert(CreatorStat::Created, count as u64);
    }
    if let Some(count) = row.get::<_, Option<i64>>(24)? {
        profile.insert(CreatorStat::Comments, count as u64);
    }

    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        blurb: row.get(3)?,
        state: ProjectState::from_db_string(&state_text).unwrap_or(ProjectState::Other),
        state_changed: row.get(5)?,
        goal: row.get(6)?,
        pledged: row.get(7)?,
        usd_pledged: row.get(8)?,
        static_usd_rate: row.get(9)?,
        backers_count: row.get(10)?,
        country: row.get(11)?,
        currency: row.get(12)?,
        created_at: parse_timestamp(13, row)?,
        launched_at: parse_timestamp(14, row)?,
        deadline: parse_timestamp(15, row)?,
        state_changed_at: parse_timestamp(16, row)?,
        updated: parse_timestamp(17, row)?,
        project_url: row.get(18)?,
        creator: CreatorRef {
            id: row.get(19)?,
            name: row.get(20)?,
            profile_url: row.get(21)?,
            profile,
        },
        document,
    })
}

fn row_to_snapshot(row: &Row<'_>) -> rusqlite::Result<StatusSnapshot> {
    let state_text: String = row.get(1)?;
    Ok(StatusSnapshot {
        time: parse_timestamp(0, row)?,
        state: ProjectState::from_db_string(&state_text).unwrap_or(ProjectState::Other),
        goal: row.get(2)?,
        pledged: row.get(3)?,
        usd_pledged: row.get(4)?,
        backers_count: row.get(5)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        mode: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Running),
    })
}

/// Writes all top-level project fields with the given SQL statement
///
/// Shared between insert and replace, and reused inside the live-update
/// transaction; only the statement text differs.
fn write_record(conn: &Connection, sql: &str, record: &ProjectRecord) -> StoreResult<()> {
    let document_text = serde_json::to_string(&record.document)?;
    conn.execute(
        sql,
        params![
            record.id,
            record.name,
            record.slug,
            record.blurb,
            record.state.to_db_string(),
            record.state_changed,
            record.goal,
            record.pledged,
            record.usd_pledged,
            record.static_usd_rate,
            record.backers_count,
            record.country,
            record.currency,
            record.created_at.to_rfc3339(),
            record.launched_at.to_rfc3339(),
            record.deadline.to_rfc3339(),
            record.state_changed_at.to_rfc3339(),
            record.updated.to_rfc3339(),
            record.project_url,
            record.creator.id,
            record.creator.name,
            record.creator.profile_url,
            record.creator.profile.get(CreatorStat::Backed).map(|c| c as i64),
            record.creator.profile.get(CreatorStat::Created).map(|c| c as i64),
            record.creator.profile.get(CreatorStat::Comments).map(|c| c as i64),
            document_text,
        ],
    )?;
    Ok(())
}

const INSERT_PROJECT_SQL: &str = "INSERT INTO projects (id, name, slug, blurb, state, state_changed, goal, pledged, \
     usd_pledged, static_usd_rate, backers_count, country, currency, created_at, launched_at, \
     deadline, state_changed_at, updated, project_url, creator_id, creator_name, creator_url, \
     creator_backed, creator_created, creator_comments, document) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
     ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)";

const REPLACE_PROJECT_SQL: &str = "UPDATE projects SET name = ?2, slug = ?3, blurb = ?4, state = ?5, state_changed = ?6, \
     goal = ?7, pledged = ?8, usd_pledged = ?9, static_usd_rate = ?10, backers_count = ?11, \
     country = ?12, currency = ?13, created_at = ?14, launched_at = ?15, deadline = ?16, \
     state_changed_at = ?17, updated = ?18, project_url = ?19, creator_id = ?20, \
     creator_name = ?21, creator_url = ?22, creator_backed = ?23, creator_created = ?24, \
     creator_comments = ?25, document = ?26 WHERE id = ?1";

const APPEND_SNAPSHOT_SQL: &str = "INSERT INTO snapshots (project_id, time, state, goal, pledged, usd_pledged, backers_count) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

fn append_snapshot_row(
    conn: &Connection,
    project_id: i64,
    snapshot: &StatusSnapshot,
) -> StoreResult<()> {
    conn.execute(
        APPEND_SNAPSHOT_SQL,
        params![
            project_id,
            snapshot.time.to_rfc3339(),
            snapshot.state.to_db_string(),
            snapshot.goal,
            snapshot.pledged,
            snapshot.usd_pledged,
            snapshot.backers_count,
        ],
    )?;
    Ok(())
}

impl ProjectStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, mode: &str, config_hash: &str) -> StoreResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (mode, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![mode, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
        )?;

        stmt.query_row(params![run_id], row_to_run)
            .optional()?
            .ok_or(StoreError::RunNotFound(run_id))
    }

    // ===== Reconciliation Primitives =====

    fn get_project_state(&self, id: i64) -> StoreResult<Option<ProjectState>> {
        let state_text: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM projects WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(state_text
            .map(|s| ProjectState::from_db_string(&s).unwrap_or(ProjectState::Other)))
    }

    fn get_project(&self, id: i64) -> StoreResult<Option<ProjectRecord>> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        Ok(stmt.query_row(params![id], row_to_record).optional()?)
    }

    fn insert_project(&mut self, record: &ProjectRecord) -> StoreResult<()> {
        write_record(&self.conn, INSERT_PROJECT_SQL, record)
    }

    fn replace_project(&mut self, record: &ProjectRecord) -> StoreResult<()> {
        write_record(&self.conn, REPLACE_PROJECT_SQL, record)
    }

    fn append_snapshot(&mut self, project_id: i64, snapshot: &StatusSnapshot) -> StoreResult<()> {
        append_snapshot_row(&self.conn, project_id, snapshot)
    }

    fn apply_live_update(
        &mut self,
        record: &ProjectRecord,
        snapshot: &StatusSnapshot,
    ) -> StoreResult<()> {
        // Append first, then overwrite, committed as one unit. The snapshot
        // must capture the sighting before its fields replace the stored row.
        let tx = self.conn.transaction()?;
        append_snapshot_row(&tx, record.id, snapshot)?;
        write_record(&tx, REPLACE_PROJECT_SQL, record)?;
        tx.commit()?;
        Ok(())
    }

    fn snapshots(&self, project_id: i64) -> StoreResult<Vec<StatusSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT time, state, goal, pledged, usd_pledged, backers_count
             FROM snapshots WHERE project_id = ?1 ORDER BY id",
        )?;

        let snapshots = stmt
            .query_map(params![project_id], row_to_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    // ===== Mode Projections =====

    fn live_project_urls(&self) -> StoreResult<Vec<ProjectUrl>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_url FROM projects WHERE state = ?1 ORDER BY id",
        )?;

        let urls = stmt
            .query_map(params![ProjectState::Live.to_db_string()], |row| {
                Ok(ProjectUrl {
                    id: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(urls)
    }

    fn projects_missing_creator_profile(&self) -> StoreResult<Vec<CreatorTarget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, slug, creator_url FROM projects
             WHERE creator_url IS NOT NULL AND creator_backed IS NULL ORDER BY id",
        )?;

        let targets = stmt
            .query_map([], |row| {
                Ok(CreatorTarget {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    profile_url: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(targets)
    }

    fn patch_creator_profile(
        &mut self,
        project_id: i64,
        profile: &CreatorProfile,
    ) -> StoreResult<()> {
        // Counters the scrape didn't find keep their stored value; an absent
        // label means "not on the page", not zero.
        let changed = self.conn.execute(
            "UPDATE projects SET
                 creator_backed = COALESCE(?1, creator_backed),
                 creator_created = COALESCE(?2, creator_created),
                 creator_comments = COALESCE(?3, creator_comments)
             WHERE id = ?4",
            params![
                profile.get(CreatorStat::Backed).map(|c| c as i64),
                profile.get(CreatorStat::Created).map(|c| c as i64),
                profile.get(CreatorStat::Comments).map(|c| c as i64),
                project_id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::ProjectNotFound(project_id));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_projects(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_projects_by_state(&self, state: ProjectState) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
