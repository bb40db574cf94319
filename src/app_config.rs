use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::retrieval::{NetworkPolicy, SelectionCriteria};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Search provider settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Subtitle index site settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Which listing entry to pick
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Timeouts and retries around network stages
    #[serde(default)]
    pub network: NetworkConfig,

    /// Reading extracted subtitle files
    #[serde(default)]
    pub materialize: MaterializeConfig,

    /// Scratch area for downloads
    #[serde(default)]
    pub scratch: ScratchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Search provider configuration (Google Custom Search)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    /// API key for the Custom Search API
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Search engine identifier (the `cx` parameter)
    #[serde(default = "String::new")]
    pub client_id: String,

    /// Service endpoint URL
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            client_id: String::new(),
            endpoint: default_search_endpoint(),
        }
    }
}

/// Subtitle index site configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SiteConfig {
    /// Base URL relative listing and download links are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Candidate selection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Subtitle language code (ISO 639-1 or 639-2)
    #[serde(default = "default_language")]
    pub language: String,

    /// Only accept entries flagged as hearing impaired
    #[serde(default = "default_true")]
    pub hearing_impaired: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            hearing_impaired: true,
        }
    }
}

impl SelectionConfig {
    /// Build the selection criteria, rendering the code to the label the site shows
    pub fn criteria(&self) -> Result<SelectionCriteria> {
        let label = crate::language_utils::listing_label(&self.language)?;
        Ok(SelectionCriteria::new(label, self.hearing_impaired))
    }
}

/// Network behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    /// Timeout in seconds for search and page requests
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout in seconds for the archive download
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Retry count for search and download
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl NetworkConfig {
    pub fn policy(&self) -> NetworkPolicy {
        NetworkPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            retry_count: self.retry_count,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// File materialization configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaterializeConfig {
    /// Maximum number of files read at once
    #[serde(default = "default_concurrent_reads")]
    pub concurrent_reads: usize,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            concurrent_reads: default_concurrent_reads(),
        }
    }
}

/// Scratch directory configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScratchConfig {
    /// Directory under which per-run scratch directories are created
    #[serde(default = "default_scratch_root")]
    pub root: PathBuf,

    /// Leave the scratch directory in place after a run
    #[serde(default = "default_true")]
    pub keep: bool,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            root: default_scratch_root(),
            keep: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_base_url() -> String {
    "https://subscene.com".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_download_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_concurrent_reads() -> usize {
    8
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let _label = crate::language_utils::listing_label(&self.selection.language)?;

        if self.search.api_key.trim().is_empty() {
            return Err(anyhow!("Search API key is required"));
        }
        if self.search.client_id.trim().is_empty() {
            return Err(anyhow!("Search client id (cx) is required"));
        }

        Url::parse(&self.search.endpoint)
            .map_err(|e| anyhow!("Invalid search endpoint '{}': {}", self.search.endpoint, e))?;
        self.base_url()?;

        if self.materialize.concurrent_reads == 0 {
            return Err(anyhow!("materialize.concurrent_reads must be at least 1"));
        }
        if self.network.timeout_secs == 0 || self.network.download_timeout_secs == 0 {
            return Err(anyhow!("Network timeouts must be greater than zero"));
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing the defaults there first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        crate::file_utils::FileManager::write_to_file(path, &config_json)
    }

    /// Parsed site base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.site.base_url)
            .map_err(|e| anyhow!("Invalid site base URL '{}': {}", self.site.base_url, e))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            search: SearchConfig::default(),
            site: SiteConfig::default(),
            selection: SelectionConfig::default(),
            network: NetworkConfig::default(),
            materialize: MaterializeConfig::default(),
            scratch: ScratchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
