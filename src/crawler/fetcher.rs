//! HTTP fetcher implementation
//!
//! This module issues the timed GET requests behind the detail and creator
//! scrapers and classifies each outcome so callers can decide between
//! retrying, giving up on the URL, and giving up on the run.

use reqwest::Client;
use std::time::Duration;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Connection refusal or timeout; retrying may help
    Transient {
        /// Error description
        error: String,
    },

    /// Non-success status code; retrying will not help
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Any other transport failure
    Failed {
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client shared by all fetchers
///
/// # Arguments
///
/// * `timeout_secs` - Per-request timeout in seconds
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("pledgewatch/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once and classifies the outcome
///
/// No retry happens at this layer; the caller owns the retry budget.
pub async fn fetch_page(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if !status.is_success() {
                return FetchOutcome::HttpError {
                    status: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success {
                    status: status.as_u16(),
                    body,
                },
                Err(e) => FetchOutcome::Failed {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchOutcome::Transient {
                    error: "request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchOutcome::Transient {
                    error: "connection refused".to_string(),
                }
            } else {
                FetchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(10).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let client = build_http_client(1).unwrap();
        // Port 1 on localhost is almost certainly closed
        let outcome = fetch_page(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(outcome, FetchOutcome::Transient { .. }));
    }
}
