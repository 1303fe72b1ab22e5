//! Core data types for scraped projects
//!
//! A [`ProjectRecord`] is created on first sighting of a platform id, updated
//! on every later sighting, and never deleted. While a project is live, each
//! sighting appends a [`StatusSnapshot`] to its history.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a project as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectState {
    /// Funding is open; sightings append snapshots
    Live,

    /// Funding closed at or above the goal
    Successful,

    /// Funding closed below the goal
    Failed,

    /// Withdrawn by the creator before the deadline
    Canceled,

    /// Taken down by the platform
    Suspended,

    /// Any state string this pipeline does not track explicitly
    Other,
}

impl ProjectState {
    /// Returns true while the project is still collecting pledges
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Suspended => "suspended",
            Self::Other => "other",
        }
    }

    /// Parses a state from a database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "live" => Some(Self::Live),
            "successful" => Some(Self::Successful),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            "suspended" => Some(Self::Suspended),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Maps a raw platform state string onto the tracked set
    ///
    /// Unlike [`from_db_string`](Self::from_db_string) this never fails:
    /// unrecognized strings collapse to [`ProjectState::Other`]. The exact
    /// platform string stays visible in the stored raw document.
    pub fn from_platform(s: &str) -> Self {
        Self::from_db_string(s).unwrap_or(Self::Other)
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A normalized project record, ready for reconciliation against the store
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    /// Platform-assigned identifier, immutable across sightings
    pub id: i64,

    pub name: Option<String>,
    pub slug: Option<String>,
    pub blurb: Option<String>,

    /// Lifecycle state at this sighting
    pub state: ProjectState,

    /// Set when a later sighting observed a transition away from live
    pub state_changed: bool,

    pub goal: f64,
    pub pledged: f64,
    pub usd_pledged: f64,
    pub static_usd_rate: f64,
    pub backers_count: u32,

    pub country: Option<String>,
    pub currency: Option<String>,

    pub created_at: DateTime<Utc>,
    pub launched_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub state_changed_at: DateTime<Utc>,

    /// When this sighting was ingested
    pub updated: DateTime<Utc>,

    /// Canonical project page URL (`urls.web.project`)
    pub project_url: String,

    pub creator: CreatorRef,

    /// The raw platform document this record was normalized from
    pub document: serde_json::Value,
}

/// Reference to the project's creator, with lazily attached profile counters
#[derive(Debug, Clone, Default)]
pub struct CreatorRef {
    pub id: Option<i64>,
    pub name: Option<String>,

    /// Profile page URL (`creator.urls.web.user`), when the feed carried one
    pub profile_url: Option<String>,

    /// Scraped counters; empty until the enrichment pass fills them in
    pub profile: CreatorProfile,
}

/// The labeled counters scraped from a creator profile page
///
/// An absent label means "not found on the page", not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CreatorStat {
    /// Projects this creator has backed
    Backed,

    /// Projects this creator has launched
    Created,

    /// Comments left on the creator's own pages
    Comments,
}

impl CreatorStat {
    /// Matches a nav label token, case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "backed" => Some(Self::Backed),
            "created" => Some(Self::Created),
            "comments" => Some(Self::Comments),
            _ => None,
        }
    }
}

/// Mapping from creator stat labels to scraped counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorProfile {
    counts: BTreeMap<CreatorStat, u64>,
}

impl CreatorProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stat: CreatorStat, count: u64) {
        self.counts.insert(stat, count);
    }

    pub fn get(&self, stat: CreatorStat) -> Option<u64> {
        self.counts.get(&stat).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CreatorStat, u64)> + '_ {
        self.counts.iter().map(|(stat, count)| (*stat, *count))
    }
}

/// An immutable point-in-time copy of a project's funding metrics
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// When the snapshot was taken; equals the record's `updated` stamp
    pub time: DateTime<Utc>,

    pub state: ProjectState,
    pub goal: f64,
    pub pledged: f64,
    pub usd_pledged: f64,
    pub backers_count: u32,
}

impl StatusSnapshot {
    /// Captures the funding metrics of a record at its `updated` time
    pub fn of(record: &ProjectRecord) -> Self {
        Self {
            time: record.updated,
            state: record.state,
            goal: record.goal,
            pledged: record.pledged,
            usd_pledged: record.usd_pledged,
            backers_count: record.backers_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_db_round_trip() {
        for state in [
            ProjectState::Live,
            ProjectState::Successful,
            ProjectState::Failed,
            ProjectState::Canceled,
            ProjectState::Suspended,
            ProjectState::Other,
        ] {
            assert_eq!(ProjectState::from_db_string(state.to_db_string()), Some(state));
        }
    }

    #[test]
    fn test_unknown_platform_state_maps_to_other() {
        assert_eq!(ProjectState::from_platform("purged"), ProjectState::Other);
        assert_eq!(ProjectState::from_platform("live"), ProjectState::Live);
        assert_eq!(ProjectState::from_db_string("purged"), None);
    }

    #[test]
    fn test_creator_stat_labels_case_insensitive() {
        assert_eq!(CreatorStat::from_label("backed"), Some(CreatorStat::Backed));
        assert_eq!(CreatorStat::from_label("Backed"), Some(CreatorStat::Backed));
        assert_eq!(CreatorStat::from_label("COMMENTS"), Some(CreatorStat::Comments));
        assert_eq!(CreatorStat::from_label("followers"), None);
    }
}
