use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub dbdir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub rooms: RoomsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

/// Where the browser client is served from. Used for CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_origin")]
    pub origin: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            origin: default_frontend_origin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(alias = "apikey", rename = "api_key")]
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for the discover page a seed can map to.
    #[serde(default = "default_max_discover_page")]
    pub max_discover_page: u32,
    #[serde(default = "default_movies_per_fetch")]
    pub movies_per_fetch: usize,
    #[serde(default = "default_popular_providers")]
    pub popular_providers: Vec<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            timeout_secs: default_timeout_secs(),
            max_discover_page: default_max_discover_page(),
            movies_per_fetch: default_movies_per_fetch(),
            popular_providers: default_popular_providers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomsConfig {
    #[serde(default = "default_expire_after_hours")]
    pub expire_after_hours: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RoomsConfig {
    pub fn expire_after(&self) -> Duration {
        Duration::from_secs(self.expire_after_hours.saturating_mul(3600))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            expire_after_hours: default_expire_after_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_frontend_origin() -> String {
    "http://localhost:4200".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_discover_page() -> u32 {
    300
}

fn default_movies_per_fetch() -> usize {
    10
}

fn default_popular_providers() -> Vec<String> {
    [
        "Netflix",
        "Disney Plus",
        "Amazon Prime Video",
        "Apple TV+",
        "Paramount Plus",
        "Hulu",
        "Curiosity Stream",
        "Crunchyroll",
        "Max",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_expire_after_hours() -> u64 {
    48
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let mut config = Self::from_yaml(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        if let Ok(key) = std::env::var("TMDB_API_KEY") {
            if !key.is_empty() {
                config.tmdb.api_key = Some(key);
            }
        }

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn get_database_path(&self) -> Option<String> {
        if let Some(ref sqlite) = self.database.sqlite {
            return Some(sqlite.filename.clone());
        }

        if let Some(ref dbdir) = self.dbdir {
            let path = PathBuf::from(dbdir).join("moviematch.db");
            return Some(path.to_string_lossy().to_string());
        }

        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}
