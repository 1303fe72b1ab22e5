//! Project detail fetcher
//!
//! A project's detail page embeds the full project document as a
//! double-quoted, backslash-escaped JSON string inside a script assignment.
//! This module fetches the page with a bounded retry budget for transient
//! network failures, then extracts and unescapes that payload.
//!
//! The attempt counter lives on the stack of each call: reusing one fetcher
//! across many URLs can never leak attempts from one URL into the next.

use crate::crawler::fetcher::{fetch_page, FetchOutcome};
use crate::PledgeError;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

/// The embedded assignment carrying the project document
const PROJECT_PATTERN: &str = r#"window\.current_project = "(.+)""#;

/// Default budget of transient-failure retries per URL
pub const REQUEST_LIMIT: u32 = 10;

/// Fetches project detail pages and extracts the embedded document
pub struct DetailFetcher {
    client: Client,
    pattern: Regex,
    request_limit: u32,
}

impl DetailFetcher {
    /// Creates a fetcher with the given retry budget
    ///
    /// # Errors
    ///
    /// Fails only if the embedded-assignment pattern does not compile.
    pub fn new(client: Client, request_limit: u32) -> Result<Self, PledgeError> {
        Ok(Self {
            client,
            pattern: Regex::new(PROJECT_PATTERN)?,
            request_limit,
        })
    }

    /// Fetches one project page and returns its embedded document
    ///
    /// Transient failures (connection refused, timeout) are retried up to
    /// the request budget. A non-success status, a missing payload, or
    /// unparsable JSON is permanent for this URL: logged, no retry, None.
    ///
    /// Callers must treat None as "skip this project and continue"; one bad
    /// URL never aborts a crawl.
    pub async fn fetch_project(&self, url: &str) -> Option<Value> {
        let mut attempts: u32 = 0;

        loop {
            match fetch_page(&self.client, url).await {
                FetchOutcome::Success { body, .. } => {
                    return self.extract_embedded_project(&body, url);
                }
                FetchOutcome::Transient { error } => {
                    attempts += 1;
                    if attempts >= self.request_limit {
                        tracing::error!(
                            "gave up on project after {} attempts: {}",
                            attempts,
                            url
                        );
                        return None;
                    }
                    tracing::warn!(
                        "No response, url: {} ({}), attempt {} of {}",
                        url,
                        error,
                        attempts,
                        self.request_limit
                    );
                }
                FetchOutcome::HttpError { status } => {
                    tracing::error!("No response, url: {}, status code: {}", url, status);
                    return None;
                }
                FetchOutcome::Failed { error } => {
                    tracing::error!("Request failed, url: {}: {}", url, error);
                    return None;
                }
            }
        }
    }

    /// Extracts and parses the embedded project JSON from a page body
    ///
    /// The payload's quotes arrive HTML-escaped and its backslashes doubled;
    /// both are undone before parsing.
    pub fn extract_embedded_project(&self, body: &str, url: &str) -> Option<Value> {
        let captures = match self.pattern.captures(body) {
            Some(captures) => captures,
            None => {
                tracing::error!("No project text found on project page: {}", url);
                return None;
            }
        };

        let escaped = captures.get(1)?.as_str();
        let unescaped = escaped.replace("&quot;", "\"").replace("\\\\", "\\");

        match serde_json::from_str(&unescaped) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::error!("Error loading embedded project JSON from {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::build_http_client;
    use serde_json::json;

    fn fetcher() -> DetailFetcher {
        DetailFetcher::new(build_http_client(1).unwrap(), 3).unwrap()
    }

    #[test]
    fn test_extract_round_trip() {
        let body = concat!(
            "<html><head><script>\n",
            r#"window.current_project = "{&quot;id&quot;:42,&quot;blurb&quot;:&quot;a \\&quot;quoted\\&quot; word&quot;}";"#,
            "\n</script></head></html>"
        );

        let document = fetcher()
            .extract_embedded_project(body, "https://example.com/p/42")
            .unwrap();

        assert_eq!(
            document,
            json!({"id": 42, "blurb": "a \"quoted\" word"})
        );
    }

    #[test]
    fn test_extract_missing_pattern() {
        let body = "<html><body>no embedded project here</body></html>";
        assert!(fetcher()
            .extract_embedded_project(body, "https://example.com/p/1")
            .is_none());
    }

    #[test]
    fn test_extract_unparsable_payload() {
        let body = r#"window.current_project = "{&quot;id&quot;:";"#;
        assert!(fetcher()
            .extract_embedded_project(body, "https://example.com/p/1")
            .is_none());
    }
}
