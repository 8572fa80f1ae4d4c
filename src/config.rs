//! TOML configuration.
//!
//! ```toml
//! [store]
//! remote_url = "https://github.com/jreisinger/homepage"
//! local_path = "/tmp/homepage"
//!
//! [sync]
//! interval_secs = 2
//!
//! [listing.ordering]
//! blog = "newest_first"
//!
//! [server]
//! bind = "127.0.0.1:5001"
//! landing_page = "about"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::listing::OrderingPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Remote repository the content is mirrored from.
    pub remote_url: String,
    /// Local clone target.
    pub local_path: PathBuf,
    /// Served subtree inside the clone.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Document suffix, without the leading dot.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub branch: Option<String>,
}

fn default_content_dir() -> String {
    "data".to_string()
}
fn default_static_dir() -> String {
    "static".to_string()
}
fn default_suffix() -> String {
    "md".to_string()
}

impl StoreConfig {
    pub fn content_root(&self) -> PathBuf {
        self.local_path.join(&self.content_dir)
    }

    pub fn static_root(&self) -> PathBuf {
        self.local_path.join(&self.static_dir)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Number of clone attempts during bootstrap before giving up.
    #[serde(default = "default_clone_attempts")]
    pub clone_attempts: u32,
    #[serde(default = "default_interval_secs")]
    pub clone_retry_secs: u64,
}

fn default_interval_secs() -> u64 {
    2
}
fn default_clone_attempts() -> u32 {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            clone_attempts: default_clone_attempts(),
            clone_retry_secs: default_interval_secs(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn clone_retry(&self) -> Duration {
        Duration::from_secs(self.clone_retry_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// Directory path (relative to the content root) -> ordering policy.
    #[serde(default = "default_ordering")]
    pub ordering: HashMap<String, OrderingPolicy>,
}

fn default_ordering() -> HashMap<String, OrderingPolicy> {
    HashMap::from([("blog".to_string(), OrderingPolicy::NewestFirst)])
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            ordering: default_ordering(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_landing_page")]
    pub landing_page: String,
}

fn default_bind() -> String {
    "127.0.0.1:5001".to_string()
}
fn default_landing_page() -> String {
    "about".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            landing_page: default_landing_page(),
        }
    }
}

impl Config {
    /// A config with every optional setting at its default.
    pub fn for_store(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig {
                remote_url: remote_url.into(),
                local_path: local_path.into(),
                content_dir: default_content_dir(),
                static_dir: default_static_dir(),
                suffix: default_suffix(),
                branch: None,
            },
            sync: SyncConfig::default(),
            listing: ListingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.store.remote_url.trim().is_empty() {
        anyhow::bail!("store.remote_url must not be empty");
    }

    let suffix = &config.store.suffix;
    if suffix.is_empty() || suffix.starts_with('.') {
        anyhow::bail!("store.suffix must be non-empty and given without a leading dot");
    }

    if config.sync.interval_secs == 0 {
        anyhow::bail!("sync.interval_secs must be > 0");
    }

    if config.sync.clone_attempts == 0 {
        anyhow::bail!("sync.clone_attempts must be >= 1");
    }

    if config.server.landing_page.trim_matches('/').is_empty() {
        anyhow::bail!("server.landing_page must name a page");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Config> {
        let config: Config = toml::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let cfg = parse(
            r#"
[store]
remote_url = "https://github.com/example/homepage"
local_path = "/tmp/homepage"
"#,
        )
        .unwrap();

        assert_eq!(cfg.store.content_root(), PathBuf::from("/tmp/homepage/data"));
        assert_eq!(cfg.store.suffix, "md");
        assert_eq!(cfg.sync.interval_secs, 2);
        assert_eq!(cfg.sync.clone_attempts, 1);
        assert_eq!(cfg.server.landing_page, "about");
        assert_eq!(
            cfg.listing.ordering.get("blog"),
            Some(&OrderingPolicy::NewestFirst)
        );
    }

    #[test]
    fn test_ordering_table_replaces_default() {
        let cfg = parse(
            r#"
[store]
remote_url = "https://example.com/repo.git"
local_path = "/tmp/repo"

[listing.ordering]
"notes/journal" = "newest_first"
"#,
        )
        .unwrap();

        assert_eq!(cfg.listing.ordering.len(), 1);
        assert_eq!(
            cfg.listing.ordering.get("notes/journal"),
            Some(&OrderingPolicy::NewestFirst)
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = parse(
            r#"
[store]
remote_url = "https://example.com/repo.git"
local_path = "/tmp/repo"

[sync]
interval_secs = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_dotted_suffix_rejected() {
        let err = parse(
            r#"
[store]
remote_url = "https://example.com/repo.git"
local_path = "/tmp/repo"
suffix = ".md"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("suffix"));
    }

    #[test]
    fn test_unknown_ordering_policy_rejected() {
        let res = parse(
            r#"
[store]
remote_url = "https://example.com/repo.git"
local_path = "/tmp/repo"

[listing.ordering]
blog = "shuffled"
"#,
        );
        assert!(res.is_err());
    }
}
