//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the pledgewatch
//! database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mode TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per project, keyed by the platform-assigned identifier
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    name TEXT,
    slug TEXT,
    blurb TEXT,
    state TEXT NOT NULL,
    state_changed INTEGER NOT NULL DEFAULT 0,
    goal REAL NOT NULL,
    pledged REAL NOT NULL,
    usd_pledged REAL NOT NULL,
    static_usd_rate REAL NOT NULL,
    backers_count INTEGER NOT NULL,
    country TEXT,
    currency TEXT,
    created_at TEXT NOT NULL,
    launched_at TEXT NOT NULL,
    deadline TEXT NOT NULL,
    state_changed_at TEXT NOT NULL,
    updated TEXT NOT NULL,
    project_url TEXT NOT NULL,
    creator_id INTEGER,
    creator_name TEXT,
    creator_url TEXT,
    creator_backed INTEGER,
    creator_created INTEGER,
    creator_comments INTEGER,
    document TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_state ON projects(state);
CREATE INDEX IF NOT EXISTS idx_projects_creator ON projects(creator_id);

-- Append-only funding history; rows are never updated or deleted
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    time TEXT NOT NULL,
    state TEXT NOT NULL,
    goal REAL NOT NULL,
    pledged REAL NOT NULL,
    usd_pledged REAL NOT NULL,
    backers_count INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshots_project ON snapshots(project_id, time);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "projects", "snapshots"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
