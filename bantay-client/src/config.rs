//! Client configuration
//!
//! Environment-variable driven, with explicit overrides taking precedence
//! over host sniffing. The smoke binary layers clap on top of this.

use std::env;

/// Default staleness window for aggregate/metrics reads.
pub const DEFAULT_METRICS_STALE_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit network selection: `"local"` or `"main"`. When unset, the
    /// apparent host decides.
    pub network: Option<String>,
    /// The host the client appears to run on (in a browser shell this is the
    /// page host; elsewhere it defaults to localhost).
    pub apparent_host: String,
    /// Base URL of the local development service.
    pub local_url: String,
    /// Base URL of the production service.
    pub main_url: String,
    /// Staleness window for metrics reads, in milliseconds.
    pub metrics_stale_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: None,
            apparent_host: "localhost".to_string(),
            local_url: "http://localhost:4943".to_string(),
            main_url: "https://ledger.bantay.app".to_string(),
            metrics_stale_ms: DEFAULT_METRICS_STALE_MS,
        }
    }
}

impl Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("BANTAY_NETWORK") {
            if !val.is_empty() {
                config.network = Some(val);
            }
        }

        if let Ok(val) = env::var("BANTAY_APPARENT_HOST") {
            if !val.is_empty() {
                config.apparent_host = val;
            }
        }

        if let Ok(val) = env::var("BANTAY_LOCAL_URL") {
            if !val.is_empty() {
                config.local_url = val;
            }
        }

        if let Ok(val) = env::var("BANTAY_MAIN_URL") {
            if !val.is_empty() {
                config.main_url = val;
            }
        }

        if let Ok(val) = env::var("BANTAY_METRICS_STALE_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.metrics_stale_ms = ms;
            }
        }

        config
    }
}
