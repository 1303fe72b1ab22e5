//! Normalization of raw feed documents
//!
//! The discovery feed and the embedded detail payload carry the same project
//! document shape: epoch-second timestamps, monetary amounts that are
//! sometimes numbers and sometimes quoted strings, and nested `urls` /
//! `creator` sub-documents. This pass coerces all of that into a typed
//! [`ProjectRecord`]. Coercion is idempotent: an already-normalized value
//! (RFC 3339 timestamp, plain number) passes through unchanged.

use crate::record::{CreatorRef, ProjectRecord, ProjectState};
use crate::NormalizeError;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Normalizes a raw project document into a [`ProjectRecord`]
///
/// `now` becomes the record's `updated` stamp; the caller supplies it so the
/// whole pass stays deterministic under test.
///
/// # Errors
///
/// Returns a [`NormalizeError`] when a required field is missing or cannot
/// be coerced. Optional descriptive fields (name, slug, country, ...) never
/// fail; they are simply absent.
pub fn normalize(raw: &Value, now: DateTime<Utc>) -> Result<ProjectRecord, NormalizeError> {
    let id = raw
        .get("id")
        .and_then(Value::as_i64)
        .ok_or(NormalizeError::MissingField("id"))?;

    let state = raw
        .get("state")
        .and_then(Value::as_str)
        .map(ProjectState::from_platform)
        .ok_or(NormalizeError::MissingField("state"))?;

    let project_url = raw
        .pointer("/urls/web/project")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(NormalizeError::MissingField("urls.web.project"))?;

    let backers_count = raw
        .get("backers_count")
        .and_then(Value::as_u64)
        .ok_or(NormalizeError::MissingField("backers_count"))? as u32;

    Ok(ProjectRecord {
        id,
        name: string_field(raw, "name"),
        slug: string_field(raw, "slug"),
        blurb: string_field(raw, "blurb"),
        state,
        state_changed: false,
        goal: money_field(raw, "goal")?,
        pledged: money_field(raw, "pledged")?,
        usd_pledged: money_field(raw, "usd_pledged")?,
        static_usd_rate: money_field(raw, "static_usd_rate")?,
        backers_count,
        country: string_field(raw, "country"),
        currency: string_field(raw, "currency"),
        created_at: timestamp_field(raw, "created_at")?,
        launched_at: timestamp_field(raw, "launched_at")?,
        deadline: timestamp_field(raw, "deadline")?,
        state_changed_at: timestamp_field(raw, "state_changed_at")?,
        updated: now,
        project_url,
        creator: creator_ref(raw),
        document: raw.clone(),
    })
}

fn string_field(raw: &Value, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

fn timestamp_field(raw: &Value, field: &'static str) -> Result<DateTime<Utc>, NormalizeError> {
    let value = raw
        .get(field)
        .ok_or(NormalizeError::MissingField(field))?;
    coerce_timestamp(field, value)
}

fn money_field(raw: &Value, field: &'static str) -> Result<f64, NormalizeError> {
    let value = raw
        .get(field)
        .ok_or(NormalizeError::MissingField(field))?;
    coerce_number(field, value)
}

/// Coerces a raw epoch number or an RFC 3339 string to an absolute time
fn coerce_timestamp(field: &'static str, value: &Value) -> Result<DateTime<Utc>, NormalizeError> {
    match value {
        Value::Number(n) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| bad_timestamp(field, value))?;
            DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| bad_timestamp(field, value))
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| bad_timestamp(field, value)),
        _ => Err(bad_timestamp(field, value)),
    }
}

/// Coerces a raw number or a quoted decimal string to a float
fn coerce_number(field: &'static str, value: &Value) -> Result<f64, NormalizeError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| bad_number(field, value)),
        Value::String(s) => s.parse::<f64>().map_err(|_| bad_number(field, value)),
        _ => Err(bad_number(field, value)),
    }
}

fn creator_ref(raw: &Value) -> CreatorRef {
    let creator = match raw.get("creator") {
        Some(c) => c,
        None => return CreatorRef::default(),
    };

    CreatorRef {
        id: creator.get("id").and_then(Value::as_i64),
        name: creator.get("name").and_then(Value::as_str).map(str::to_string),
        profile_url: creator
            .pointer("/urls/web/user")
            .and_then(Value::as_str)
            .map(str::to_string),
        profile: Default::default(),
    }
}

fn bad_timestamp(field: &'static str, value: &Value) -> NormalizeError {
    NormalizeError::BadTimestamp {
        field,
        value: value.to_string(),
    }
}

fn bad_number(field: &'static str, value: &Value) -> NormalizeError {
    NormalizeError::BadNumber {
        field,
        value: value.to_string(),
    }
}
