//! Discovery feed pagination
//!
//! The platform's search endpoint serves results one page at a time and
//! reports `total_hits`, the count of matching projects across all pages.
//! [`DiscoveryFeed`] drives the paged queries and owns the page cursor, so
//! callers never hand over (or accidentally reuse) a mutable options bag.
//!
//! Stopping rules: the feed ends once the running record count reaches
//! `total_hits`, or at the hard page ceiling of 200 — the platform does not
//! serve results beyond it. A failed response also ends the feed; pagination
//! failures are not assumed transient, so there is no retry here.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;

/// The platform stops serving discovery pages past this page number
pub const PAGE_CEILING: u32 = 200;

/// Sort orders accepted by the discovery endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    EndDate,
    MostFunded,
}

impl SortOrder {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::EndDate => "end_date",
            Self::MostFunded => "most_funded",
        }
    }
}

/// Lifecycle filter accepted by the discovery endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Live,
    Successful,
    Failed,
}

impl StateFilter {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

/// Query parameters for one discovery sweep
///
/// The page number is not part of the options; the feed owns that cursor.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    pub sort: SortOrder,
    pub state: Option<StateFilter>,
    pub category_id: Option<u32>,
    pub woe_id: Option<u32>,
}

impl DiscoveryOptions {
    /// The newest-live sweep: most recent projects still collecting pledges
    pub fn newest_live() -> Self {
        Self {
            sort: SortOrder::Newest,
            state: Some(StateFilter::Live),
            category_id: None,
            woe_id: None,
        }
    }
}

/// One page of the discovery response
#[derive(Debug, Deserialize)]
struct DiscoveryEnvelope {
    total_hits: u64,
    projects: Vec<Value>,
}

/// A finite, non-restartable iterator over discovery pages
///
/// Not restartable: once the feed ends (all hits seen, page ceiling, or a
/// failed response) it stays ended. Build a new feed for a new sweep.
pub struct DiscoveryFeed<'a> {
    client: &'a Client,
    endpoint: &'a str,
    options: DiscoveryOptions,
    page: u32,
    records_seen: u64,
    total_hits: u64,
    buffer: VecDeque<Value>,
    done: bool,
    failure: Option<String>,
}

impl<'a> DiscoveryFeed<'a> {
    pub fn new(client: &'a Client, endpoint: &'a str, options: DiscoveryOptions) -> Self {
        Self {
            client,
            endpoint,
            options,
            page: 1,
            records_seen: 0,
            total_hits: 0,
            buffer: VecDeque::new(),
            done: false,
            failure: None,
        }
    }

    /// Fetches and yields the next page of raw project records
    ///
    /// Returns None once the feed has ended. The final page of a sweep may
    /// be followed by empty pages on a misbehaving feed; those are yielded
    /// as-is until a stopping rule fires.
    pub async fn next_page(&mut self) -> Option<Vec<Value>> {
        if self.done {
            return None;
        }

        let mut query: Vec<(&str, String)> = vec![
            ("page", self.page.to_string()),
            ("format", "json".to_string()),
            ("sort", self.options.sort.as_query_value().to_string()),
        ];
        if let Some(state) = self.options.state {
            query.push(("state", state.as_query_value().to_string()));
        }
        if let Some(category_id) = self.options.category_id {
            query.push(("category_id", category_id.to_string()));
        }
        if let Some(woe_id) = self.options.woe_id {
            query.push(("woe_id", woe_id.to_string()));
        }

        let response = match self.client.get(self.endpoint).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("discovery request failed on page {}: {}", self.page, e);
                self.fail(format!("request failed on page {}: {}", self.page, e));
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("discovery request error, status code: {}", status.as_u16());
            self.fail(format!(
                "status code {} on page {}",
                status.as_u16(),
                self.page
            ));
            return None;
        }

        let envelope: DiscoveryEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!("discovery response on page {} was not JSON: {}", self.page, e);
                self.fail(format!("malformed response on page {}: {}", self.page, e));
                return None;
            }
        };

        self.total_hits = envelope.total_hits;
        self.records_seen += envelope.projects.len() as u64;

        tracing::info!("total_hits: {}", self.total_hits);
        tracing::info!("Scanning page: {}", self.page);
        tracing::info!("Project: {} out of {}", self.records_seen, self.total_hits);

        if self.records_seen >= self.total_hits || self.page >= PAGE_CEILING {
            self.done = true;
        }
        self.page += 1;

        Some(envelope.projects)
    }

    /// Flattens the pages into a sequence of individual records
    pub async fn next_record(&mut self) -> Option<Value> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(record);
            }
            let page = self.next_page().await?;
            self.buffer.extend(page);
        }
    }

    /// Why the feed ended early, if a response failed
    ///
    /// None after a clean end (all hits seen or page ceiling reached).
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Cumulative record count across yielded pages
    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    /// `total_hits` as last reported by the endpoint
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn fail(&mut self, message: String) {
        self.failure = Some(message);
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_query_values() {
        assert_eq!(SortOrder::Newest.as_query_value(), "newest");
        assert_eq!(SortOrder::EndDate.as_query_value(), "end_date");
    }

    #[test]
    fn test_newest_live_options() {
        let options = DiscoveryOptions::newest_live();
        assert_eq!(options.sort, SortOrder::Newest);
        assert_eq!(options.state, Some(StateFilter::Live));
        assert!(options.category_id.is_none());
        assert!(options.woe_id.is_none());
    }
}
