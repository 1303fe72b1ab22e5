//! Crawl coordinator - run-mode orchestration
//!
//! This module composes the discovery feed, the detail and creator fetchers,
//! and the change-tracking upsert into the four documented run modes:
//!
//! - **Full scan**: geography × category × state × sort cross product over
//!   the discovery feed; a multi-hour exhaustive sweep.
//! - **Newest-live scan**: one newest-first sweep over live projects,
//!   bounded by the feed's stopping rules (roughly the most recent ~4000).
//! - **Live refresh**: re-fetch every stored live project from its detail
//!   page and reconcile the result.
//! - **Creator enrichment**: scrape profile counters for projects that do
//!   not have them yet and patch them in.
//!
//! Failure containment: anything that goes wrong with one record — a fetch
//! that exhausts its budget, a malformed payload, a normalization error — is
//! logged and skipped. Only a failed discovery response or a store failure
//! aborts a run.

use crate::config::Config;
use crate::crawler::creator::CreatorFetcher;
use crate::crawler::detail::DetailFetcher;
use crate::crawler::discovery::{DiscoveryFeed, DiscoveryOptions, SortOrder, StateFilter};
use crate::crawler::fetcher::build_http_client;
use crate::reconcile;
use crate::record::ProjectState;
use crate::storage::{open_store, ProjectStore, RunStatus, SqliteStore};
use crate::{ConfigError, PledgeError, Result};
use chrono::Utc;
use reqwest::Client;
use std::path::Path;

/// The four documented run modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Exhaustive sweep over all configured filters; takes hours
    FullScan,

    /// The most recent live projects only
    NewestLive,

    /// Re-fetch all stored live projects from their detail pages
    RefreshLive,

    /// Scrape profile counters for creators that lack them
    EnrichCreators,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullScan => "full-scan",
            Self::NewestLive => "newest",
            Self::RefreshLive => "refresh-live",
            Self::EnrichCreators => "enrich-creators",
        }
    }
}

/// Lifecycle filters swept by the full scan
const FULL_SCAN_STATES: [StateFilter; 3] = [
    StateFilter::Live,
    StateFilter::Successful,
    StateFilter::Failed,
];

/// Sort orders swept by the full scan
const FULL_SCAN_SORTS: [SortOrder; 2] = [SortOrder::Newest, SortOrder::EndDate];

/// Main coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    store: SqliteStore,
    client: Client,
    detail: DetailFetcher,
    creator: CreatorFetcher,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the store and builds the HTTP client up front; a store that
    /// cannot be opened is fatal here, before any crawling starts.
    pub fn new(config: Config, config_hash: String) -> Result<Self> {
        let store = open_store(Path::new(&config.store.database_path))?;
        let client = build_http_client(config.platform.request_timeout_secs)?;
        let detail = DetailFetcher::new(client.clone(), config.platform.request_limit)?;
        let creator = CreatorFetcher::new(client.clone());

        Ok(Self {
            config,
            config_hash,
            store,
            client,
            detail,
            creator,
        })
    }

    /// Runs one mode to completion, with run bookkeeping around it
    ///
    /// The run row moves from `running` to `completed` or `aborted`, so the
    /// database always shows whether a run finished cleanly.
    pub async fn run(&mut self, mode: RunMode) -> Result<()> {
        let run_id = self.store.create_run(mode.as_str(), &self.config_hash)?;
        tracing::info!("Starting {} run {}", mode.as_str(), run_id);
        let started = std::time::Instant::now();

        let result = match mode {
            RunMode::FullScan => self.full_scan().await,
            RunMode::NewestLive => self.newest_live().await,
            RunMode::RefreshLive => self.refresh_live().await,
            RunMode::EnrichCreators => self.enrich_creators().await,
        };

        match &result {
            Ok(()) => {
                self.store.finish_run(run_id, RunStatus::Completed)?;
                tracing::info!(
                    "Run {} completed in {:?}",
                    run_id,
                    started.elapsed()
                );
                self.log_state_summary();
            }
            Err(e) => {
                tracing::error!("Run {} aborted: {}", run_id, e);
                self.store.finish_run(run_id, RunStatus::Aborted)?;
            }
        }

        result
    }

    /// Sweeps the cross product of configured filters over the discovery feed
    async fn full_scan(&mut self) -> Result<()> {
        if self.config.discovery.category_ids.is_empty() {
            return Err(PledgeError::Config(ConfigError::Validation(
                "full scan requires discovery.category-ids".to_string(),
            )));
        }

        let woe_ids = self.config.discovery.woe_ids.clone();
        // Scan categories newest-registered first
        let category_ids: Vec<u32> =
            self.config.discovery.category_ids.iter().rev().copied().collect();

        for &woe_id in &woe_ids {
            for &category_id in &category_ids {
                tracing::info!("scanning category ID: {} (woe {})", category_id, woe_id);
                for state in FULL_SCAN_STATES {
                    for sort in FULL_SCAN_SORTS {
                        let options = DiscoveryOptions {
                            sort,
                            state: Some(state),
                            category_id: Some(category_id),
                            woe_id: Some(woe_id),
                        };
                        self.scan_feed(options).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Sweeps the newest live projects
    async fn newest_live(&mut self) -> Result<()> {
        self.scan_feed(DiscoveryOptions::newest_live()).await?;
        Ok(())
    }

    /// Drives one discovery feed and upserts every yielded record
    ///
    /// Per-record failures are logged and skipped; a failed feed response
    /// aborts the run.
    async fn scan_feed(&mut self, options: DiscoveryOptions) -> Result<u64> {
        let mut feed = DiscoveryFeed::new(&self.client, &self.config.platform.discover_url, options);

        let mut processed: u64 = 0;
        let mut skipped: u64 = 0;

        while let Some(raw) = feed.next_record().await {
            match reconcile::upsert_project(&mut self.store, &raw, Utc::now()) {
                Ok(_) => processed += 1,
                Err(PledgeError::Normalize(e)) => {
                    skipped += 1;
                    tracing::error!("Skipping malformed feed record: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(failure) = feed.failure() {
            return Err(PledgeError::Discovery(failure.to_string()));
        }

        if skipped > 0 {
            tracing::warn!("Feed sweep done: {} upserted, {} skipped", processed, skipped);
        }
        Ok(processed)
    }

    /// Re-fetches every stored live project from its detail page
    async fn refresh_live(&mut self) -> Result<()> {
        let targets = self.store.live_project_urls()?;
        let total = targets.len();
        tracing::info!("Found {} live projects", total);

        for (i, target) in targets.iter().enumerate() {
            tracing::info!("scanning project {} of {}", i + 1, total);

            match self.detail.fetch_project(&target.url).await {
                Some(raw) => {
                    if let Err(e) =
                        reconcile::upsert_project(&mut self.store, &raw, Utc::now())
                    {
                        match e {
                            PledgeError::Normalize(e) => {
                                tracing::error!(
                                    "Skipping project {}: malformed detail payload: {}",
                                    target.id,
                                    e
                                );
                            }
                            e => return Err(e),
                        }
                    }
                }
                None => {
                    tracing::error!("received empty project! url: {}", target.url);
                }
            }
        }

        Ok(())
    }

    /// Scrapes and patches creator counters for projects lacking them
    async fn enrich_creators(&mut self) -> Result<()> {
        let targets = self.store.projects_missing_creator_profile()?;
        tracing::info!("Found {} projects without creator data", targets.len());

        for target in targets {
            let slug = target.slug.as_deref().unwrap_or("<no slug>");
            tracing::info!("Updating creator info for project: {}", slug);

            match self.creator.fetch_profile(&target.profile_url).await {
                Some(profile) if !profile.is_empty() => {
                    self.store.patch_creator_profile(target.id, &profile)?;
                }
                Some(_) => {
                    tracing::info!("No counters found on creator page for project: {}", slug);
                }
                None => {
                    tracing::info!("Failed to get creator info for project: {}", slug);
                }
            }
        }

        Ok(())
    }

    /// Logs how many projects the store holds per lifecycle state
    fn log_state_summary(&self) {
        let total = match self.store.count_projects() {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!("Could not read store summary: {}", e);
                return;
            }
        };
        tracing::info!("Store now holds {} projects", total);

        for state in [
            ProjectState::Live,
            ProjectState::Successful,
            ProjectState::Failed,
            ProjectState::Canceled,
            ProjectState::Suspended,
            ProjectState::Other,
        ] {
            if let Ok(count) = self.store.count_projects_by_state(state) {
                if count > 0 {
                    tracing::info!("  {}: {}", state, count);
                }
            }
        }
    }
}
