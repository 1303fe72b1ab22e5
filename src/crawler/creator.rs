//! Creator profile scraper
//!
//! A creator's public page carries a small subnav whose list items pair a
//! label with a count (projects backed, projects created, comments). This
//! module fetches the page — one attempt, no retry — and parses those items
//! into a [`CreatorProfile`].

use crate::crawler::fetcher::{fetch_page, FetchOutcome};
use crate::record::{CreatorProfile, CreatorStat};
use reqwest::Client;
use scraper::{Html, Selector};

/// The nav items holding the profile counters
const NAV_ITEM_SELECTOR: &str = "li.nav--subnav__item";

/// Fetches creator profile pages and scrapes their counters
pub struct CreatorFetcher {
    client: Client,
}

impl CreatorFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches one creator page and scrapes the profile counters
    ///
    /// A single attempt: any fetch failure is logged and yields None, and
    /// the caller skips the project. Parsing follows the partial-success
    /// rule of [`parse_creator_nav`].
    pub async fn fetch_profile(&self, url: &str) -> Option<CreatorProfile> {
        match fetch_page(&self.client, url).await {
            FetchOutcome::Success { body, .. } => parse_creator_nav(&body, url),
            FetchOutcome::Transient { error } => {
                tracing::warn!("No response, url: {} ({})", url, error);
                None
            }
            FetchOutcome::HttpError { status } => {
                tracing::error!("No response, url: {}, status code: {}", url, status);
                None
            }
            FetchOutcome::Failed { error } => {
                tracing::error!("Request failed, url: {}: {}", url, error);
                None
            }
        }
    }
}

/// Parses the profile subnav out of a creator page body
///
/// Each list item should split into a leading label token and a following
/// count token. Items with fewer than two tokens are not counters and are
/// ignored; a recognized label whose count fails to parse is logged and
/// skipped, and whatever was collected so far is still returned. Only a
/// structurally absent nav block (layout change, deleted user page) yields
/// None.
pub fn parse_creator_nav(html: &str, url: &str) -> Option<CreatorProfile> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(NAV_ITEM_SELECTOR).ok()?;

    let items: Vec<_> = document.select(&selector).collect();
    if items.is_empty() {
        tracing::info!("Couldn't find profile nav, user page deleted? {}", url);
        return None;
    }

    let mut profile = CreatorProfile::new();
    for item in items {
        let text = item.text().collect::<String>();
        let mut tokens = text.split_whitespace();

        let (label, count) = match (tokens.next(), tokens.next()) {
            (Some(label), Some(count)) => (label, count),
            _ => continue,
        };

        let stat = match CreatorStat::from_label(label) {
            Some(stat) => stat,
            None => {
                tracing::debug!("Ignoring unrecognized nav label: {}", label);
                continue;
            }
        };

        match count.replace(',', "").parse::<u64>() {
            Ok(value) => profile.insert(stat, value),
            Err(_) => {
                tracing::warn!(
                    "Failed to extract creator count from {:?} on {}",
                    text.trim(),
                    url
                );
            }
        }
    }

    tracing::info!("Updated creator data: {:?}", profile);
    Some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav_page(items: &[&str]) -> String {
        let list_items: String = items
            .iter()
            .map(|item| format!("<li class=\"nav--subnav__item\">{}</li>", item))
            .collect();
        format!(
            "<html><body><nav><ul>{}</ul></nav></body></html>",
            list_items
        )
    }

    #[test]
    fn test_parse_full_profile() {
        let html = nav_page(&["Backed 12", "Created 3", "Comments 47"]);
        let profile = parse_creator_nav(&html, "https://example.com/profile/1").unwrap();

        assert_eq!(profile.len(), 3);
        assert_eq!(profile.get(CreatorStat::Backed), Some(12));
        assert_eq!(profile.get(CreatorStat::Created), Some(3));
        assert_eq!(profile.get(CreatorStat::Comments), Some(47));
    }

    #[test]
    fn test_partial_parse_keeps_well_formed_items() {
        // One malformed single-token item among well-formed ones
        let html = nav_page(&["Backed 12", "Projects", "Created 3"]);
        let profile = parse_creator_nav(&html, "https://example.com/profile/1").unwrap();

        assert_eq!(profile.len(), 2);
        assert_eq!(profile.get(CreatorStat::Backed), Some(12));
        assert_eq!(profile.get(CreatorStat::Created), Some(3));
        assert_eq!(profile.get(CreatorStat::Comments), None);
    }

    #[test]
    fn test_non_numeric_count_is_skipped() {
        let html = nav_page(&["Backed twelve", "Comments 9"]);
        let profile = parse_creator_nav(&html, "https://example.com/profile/1").unwrap();

        assert_eq!(profile.len(), 1);
        assert_eq!(profile.get(CreatorStat::Comments), Some(9));
    }

    #[test]
    fn test_thousands_separator() {
        let html = nav_page(&["Backed 1,204"]);
        let profile = parse_creator_nav(&html, "https://example.com/profile/1").unwrap();

        assert_eq!(profile.get(CreatorStat::Backed), Some(1204));
    }

    #[test]
    fn test_absent_nav_block() {
        let html = "<html><body><p>This page has moved.</p></body></html>";
        assert!(parse_creator_nav(html, "https://example.com/profile/1").is_none());
    }

    #[test]
    fn test_nested_markup_in_items() {
        let html = nav_page(&["<span>Backed</span> <b>12</b>"]);
        let profile = parse_creator_nav(&html, "https://example.com/profile/1").unwrap();

        assert_eq!(profile.get(CreatorStat::Backed), Some(12));
    }
}
