use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

/// Knowledge-base API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Preferred label/search language
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Bound on phase-one hit count
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    /// Settle delay before a submitted search fires
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Tree expansion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TreeConfig {
    /// Depth bound for recursive expansion
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_endpoint() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("kintree/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_search_limit() -> usize {
    12
}

fn default_settle_ms() -> u64 {
    250
}

fn default_max_depth() -> usize {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) first.
    /// Looks for the config file in this order:
    /// 1. Path specified in KINTREE_CONFIG environment variable
    /// 2. ./kintree.toml in current directory
    ///
    /// A missing file is not an error: every field has a default suitable
    /// for the public knowledge base.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KINTREE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("kintree.toml"));

        let config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&config_str).context("Failed to parse kintree.toml")?
        } else {
            Config::default()
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        Url::parse(&self.api.endpoint).with_context(|| {
            format!("api.endpoint is not a valid URL: {}", self.api.endpoint)
        })?;

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        if self.search.limit == 0 {
            anyhow::bail!("search.limit must be greater than 0");
        }

        if self.search.limit > 50 {
            anyhow::bail!("search.limit must be at most 50 (API batch ceiling)");
        }

        if self.tree.max_depth > 8 {
            anyhow::bail!(
                "tree.max_depth must be at most 8 (fetch volume grows with the branching factor)"
            );
        }

        Ok(())
    }
}
