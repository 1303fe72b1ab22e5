//! Crawler module for feed pagination and page scraping
//!
//! This module contains the crawling half of the pipeline:
//! - HTTP fetching with outcome classification
//! - Discovery feed pagination with its stopping rules
//! - Detail page fetching with a bounded retry budget
//! - Creator profile scraping
//! - Run-mode orchestration

mod coordinator;
mod creator;
mod detail;
mod discovery;
mod fetcher;

pub use coordinator::{Coordinator, RunMode};
pub use creator::{parse_creator_nav, CreatorFetcher};
pub use detail::{DetailFetcher, REQUEST_LIMIT};
pub use discovery::{
    DiscoveryFeed, DiscoveryOptions, SortOrder, StateFilter, PAGE_CEILING,
};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome};
