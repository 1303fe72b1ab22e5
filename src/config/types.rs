use serde::Deserialize;

/// Main configuration structure for pledgewatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Remote platform endpoints and request behavior
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Discovery feed endpoint
    #[serde(rename = "discover-url", default = "default_discover_url")]
    pub discover_url: String,

    /// Per-request timeout for detail and creator page fetches (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How many transient failures a single detail fetch may retry through
    #[serde(rename = "request-limit", default = "default_request_limit")]
    pub request_limit: u32,
}

/// Filters driving the full discovery sweep
///
/// The category-id list is the bootstrap set the original operators kept in
/// an external records file; here it is plain configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DiscoveryConfig {
    /// Platform category identifiers to sweep in the full scan
    #[serde(rename = "category-ids", default)]
    pub category_ids: Vec<u32>,

    /// Geographic (where-on-earth) identifiers to sweep in the full scan
    #[serde(rename = "woe-ids", default)]
    pub woe_ids: Vec<u32>,
}

fn default_discover_url() -> String {
    "https://www.kickstarter.com/discover/advanced".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_request_limit() -> u32 {
    crate::crawler::REQUEST_LIMIT
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            discover_url: default_discover_url(),
            request_timeout_secs: default_request_timeout(),
            request_limit: default_request_limit(),
        }
    }
}
