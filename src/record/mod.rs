//! Project record model and normalization
//!
//! This module defines the typed shape of a scraped project record, its
//! lifecycle state, the append-only funding snapshots, and the creator
//! profile counters, plus the normalization pass that turns a raw feed
//! document into a typed record.

mod normalize;
mod project;

pub use normalize::normalize;
pub use project::{
    CreatorProfile, CreatorRef, CreatorStat, ProjectRecord, ProjectState, StatusSnapshot,
};
