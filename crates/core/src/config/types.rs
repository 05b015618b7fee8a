use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rating: RatingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Remote catalog (OMDb-compatible) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog API key, sent as the `apikey` query parameter.
    pub api_key: String,
    /// Endpoint that serves both search (`s=`) and detail (`i=`) lookups.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl CatalogConfig {
    /// Catalog config with the given key and default endpoint/timeout.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.omdbapi.com/".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Watched-list storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Slot name holding the serialized watched list.
    #[serde(default = "default_watched_key")]
    pub watched_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            watched_key: default_watched_key(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("popcorn.db")
}

fn default_watched_key() -> String {
    "watched".to_string()
}

/// Search behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Queries shorter than this never reach the catalog.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: default_min_query_len(),
        }
    }
}

fn default_min_query_len() -> usize {
    3
}

/// User rating scale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatingConfig {
    #[serde(default = "default_max_rating")]
    pub max_rating: u8,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            max_rating: default_max_rating(),
        }
    }
}

fn default_max_rating() -> u8 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub catalog: SanitizedCatalogConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub rating: RatingConfig,
}

/// Sanitized catalog config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                api_key_configured: !config.catalog.api_key.is_empty(),
                timeout_secs: config.catalog.timeout_secs,
            },
            server: config.server.clone(),
            storage: config.storage.clone(),
            search: config.search.clone(),
            rating: config.rating.clone(),
        }
    }
}
