//! Configuration module for pledgewatch
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. The configuration carries the database path, the platform
//! endpoints and request budgets, and the injected category-id / woe-id
//! bootstrap lists for the full discovery sweep.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DiscoveryConfig, PlatformConfig, StoreConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
