//! Change-tracking upsert
//!
//! Reconciles one normalized sighting of a project against the store. The
//! decision logic: first sightings insert; while the stored state is live,
//! every sighting appends a funding snapshot before overwriting the record;
//! a transition away from live raises the `state_changed` flag; sightings of
//! already-finished projects overwrite without appending.

use crate::record::{self, ProjectState, StatusSnapshot};
use crate::storage::ProjectStore;
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// What one upsert did to the store, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// First sighting of this identifier
    pub inserted: bool,

    /// The stored state was live and this sighting's state differs
    pub state_changed: bool,

    /// A snapshot was appended to the funding history
    pub snapshot_appended: bool,
}

/// Normalizes a raw project document and reconciles it against the store
///
/// `now` becomes the record's `updated` stamp and the snapshot time.
///
/// # Algorithm
///
/// 1. Normalize the raw document (timestamps, monetary floats, `updated`).
/// 2. Look up the stored state for the identifier. Absent → insert the
///    record; its own state stands in for the prior state.
/// 3. `state_changed` is raised only for a transition *away from* live.
/// 4. Stored state live → append a snapshot of this sighting, then overwrite
///    the top-level fields. Both writes are one atomic pair in the store,
///    append ordered first.
/// 5. Stored state not live → overwrite only. Finished projects are not
///    normally re-scanned, so this path is logged.
///
/// # Errors
///
/// Normalization and store failures propagate; the caller decides whether a
/// failed record aborts anything (the orchestrator never lets it).
pub fn upsert_project(
    store: &mut dyn ProjectStore,
    raw: &Value,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    let mut record = record::normalize(raw, now)?;

    let stored_state = store.get_project_state(record.id)?;

    let (inserted, old_state) = match stored_state {
        Some(state) => (false, state),
        None => {
            store.insert_project(&record)?;
            tracing::info!(
                "New project found: {}",
                record.slug.as_deref().unwrap_or("<no slug>")
            );
            // A first sighting has no prior state to differ from
            (true, record.state)
        }
    };

    record.state_changed = old_state != record.state && old_state == ProjectState::Live;

    let outcome = UpsertOutcome {
        inserted,
        state_changed: record.state_changed,
        snapshot_appended: old_state == ProjectState::Live,
    };

    if old_state == ProjectState::Live {
        let snapshot = StatusSnapshot::of(&record);
        store.apply_live_update(&record, &snapshot)?;
        tracing::info!(
            "Updated live project: {} (state: {}, pledged: {})",
            record.id,
            record.state,
            record.pledged
        );
    } else {
        store.replace_project(&record)?;
        // Finished projects should not come back around under normal runs
        tracing::info!(
            "Updated finished project: {} (state: {})",
            record.id,
            record.state
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CreatorStat;
    use crate::storage::SqliteStore;
    use serde_json::json;

    fn sighting(id: i64, state: &str, pledged: f64, backers: u64) -> Value {
        json!({
            "id": id,
            "name": "Field Recorder",
            "slug": "field-recorder",
            "state": state,
            "goal": 5000,
            "pledged": pledged,
            "usd_pledged": pledged.to_string(),
            "static_usd_rate": 1.0,
            "backers_count": backers,
            "country": "US",
            "currency": "USD",
            "created_at": 1493164800,
            "launched_at": 1493251200,
            "deadline": 1495843200,
            "state_changed_at": 1493251200,
            "urls": {"web": {"project": format!("https://example.com/projects/{}", id)}},
            "creator": {
                "id": 77,
                "name": "Ada",
                "urls": {"web": {"user": "https://example.com/profile/77"}}
            }
        })
    }

    #[test]
    fn test_insert_path() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();

        let outcome = upsert_project(&mut store, &sighting(1, "live", 100.0, 3), now).unwrap();

        assert!(outcome.inserted);
        assert!(!outcome.state_changed);
        assert!(outcome.snapshot_appended);

        let record = store.get_project(1).unwrap().unwrap();
        assert_eq!(record.state, ProjectState::Live);
        assert!(!record.state_changed);
        assert_eq!(store.snapshots(1).unwrap().len(), 1);
        assert_eq!(store.count_projects().unwrap(), 1);
    }

    #[test]
    fn test_insert_of_finished_project_has_no_snapshot() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let outcome =
            upsert_project(&mut store, &sighting(1, "successful", 6000.0, 80), Utc::now()).unwrap();

        assert!(outcome.inserted);
        assert!(!outcome.state_changed);
        assert!(!outcome.snapshot_appended);
        assert!(store.snapshots(1).unwrap().is_empty());
    }

    #[test]
    fn test_live_to_live_appends_snapshot() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let first = Utc::now();
        upsert_project(&mut store, &sighting(1, "live", 100.0, 3), first).unwrap();

        let outcome =
            upsert_project(&mut store, &sighting(1, "live", 250.0, 7), Utc::now()).unwrap();

        assert!(!outcome.inserted);
        assert!(!outcome.state_changed);
        assert!(outcome.snapshot_appended);

        let snapshots = store.snapshots(1).unwrap();
        assert_eq!(snapshots.len(), 2);
        // The first snapshot is untouched by the second sighting
        assert_eq!(snapshots[0].pledged, 100.0);
        assert_eq!(snapshots[0].backers_count, 3);
        assert_eq!(snapshots[1].pledged, 250.0);

        let record = store.get_project(1).unwrap().unwrap();
        assert_eq!(record.pledged, 250.0);
        assert!(!record.state_changed);
    }

    #[test]
    fn test_live_to_successful_flags_transition() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        upsert_project(&mut store, &sighting(1, "live", 100.0, 3), Utc::now()).unwrap();

        let outcome =
            upsert_project(&mut store, &sighting(1, "successful", 6000.0, 90), Utc::now()).unwrap();

        assert!(outcome.state_changed);
        // The stored state was live, so this sighting still snapshots
        assert!(outcome.snapshot_appended);

        let record = store.get_project(1).unwrap().unwrap();
        assert_eq!(record.state, ProjectState::Successful);
        assert!(record.state_changed);
        assert_eq!(record.pledged, 6000.0);
        assert_eq!(store.snapshots(1).unwrap().len(), 2);
    }

    #[test]
    fn test_finished_resighting_is_not_flagged() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        upsert_project(&mut store, &sighting(1, "successful", 6000.0, 90), Utc::now()).unwrap();

        let outcome =
            upsert_project(&mut store, &sighting(1, "canceled", 6000.0, 90), Utc::now()).unwrap();

        // successful -> canceled is not a transition away from live
        assert!(!outcome.state_changed);
        assert!(!outcome.snapshot_appended);

        let record = store.get_project(1).unwrap().unwrap();
        assert_eq!(record.state, ProjectState::Canceled);
        assert!(store.snapshots(1).unwrap().is_empty());
    }

    #[test]
    fn test_overwrite_clears_unscraped_creator_counters() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        upsert_project(&mut store, &sighting(1, "live", 100.0, 3), Utc::now()).unwrap();

        let mut profile = crate::record::CreatorProfile::new();
        profile.insert(CreatorStat::Backed, 4);
        store.patch_creator_profile(1, &profile).unwrap();

        // A plain feed sighting carries no counters; the overwrite clears them.
        // Enrichment will fill them back in on its next pass.
        upsert_project(&mut store, &sighting(1, "live", 200.0, 5), Utc::now()).unwrap();

        let record = store.get_project(1).unwrap().unwrap();
        assert_eq!(record.creator.profile.get(CreatorStat::Backed), None);
        assert_eq!(store.projects_missing_creator_profile().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = upsert_project(&mut store, &json!({"id": 1}), Utc::now());
        assert!(result.is_err());
        assert_eq!(store.count_projects().unwrap(), 0);
    }
}
