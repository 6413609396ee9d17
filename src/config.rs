use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Highest config layout this build understands. An omitted version is
/// read as 0 and accepted.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub paths: Paths,
    pub page_cache: PageCacheConfig,
    pub scrape: ScrapeConfig,
    pub search: SearchConfig,
    pub charts: ChartsConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Reads the config file. A missing file means "use the defaults",
    /// anything else that goes wrong is fatal.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            log::info!(
                "config {} not found, using defaults",
                path.to_string_lossy()
            );
            let cfg = Config::default();
            cfg.validate()?;
            return Ok(cfg);
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Config = toml::from_str(&contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "config version {} is newer than supported version {CONFIG_VERSION}",
                self.version
            )));
        }
        let empty = |p: &Path| p.as_os_str().is_empty();
        if empty(&self.paths.data_dir) {
            return Err(ConfigError::Invalid("paths.data_dir is empty".into()));
        }
        if empty(&self.paths.web_dir) {
            return Err(ConfigError::Invalid("paths.web_dir is empty".into()));
        }
        if empty(&self.paths.lookup_cache) {
            return Err(ConfigError::Invalid("paths.lookup_cache is empty".into()));
        }
        if !self.page_cache.in_memory && self.page_cache.path.is_none() {
            return Err(ConfigError::Invalid(
                "page_cache.path is required unless page_cache.in_memory is set".into(),
            ));
        }
        if self.scrape.backoff_secs.is_empty() {
            return Err(ConfigError::Invalid(
                "scrape.backoff_secs needs at least one attempt".into(),
            ));
        }
        if self.scrape.max_pages == 0 {
            return Err(ConfigError::Invalid("scrape.max_pages must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Paths {
    /// persisted playlists live here
    pub data_dir: PathBuf,
    /// rendered html pages
    pub web_dir: PathBuf,
    /// gzip snapshot of the YouTube Music lookups
    pub lookup_cache: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            web_dir: PathBuf::from("web"),
            lookup_cache: PathBuf::from("data/ytmusic-cache.json.gz"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PageCacheConfig {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            in_memory: false,
            path: Some(PathBuf::from("data/http-cache.db")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub radio_id: u32,
    /// minimum delay between two network requests
    pub request_delay_ms: u64,
    /// waits between retries of a failed page fetch
    pub backoff_secs: Vec<u64>,
    pub max_pages: u32,
    pub timeout_secs: u64,
}

impl ScrapeConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_secs
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect()
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nova.fr".to_string(),
            radio_id: 910,
            request_delay_ms: 2000,
            backoff_secs: vec![30, 20, 30, 30],
            max_pages: 100,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub client_version: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://music.youtube.com/youtubei/v1/search".to_string(),
            client_version: "1.20240101.01.00".to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartsConfig {
    /// yearly aggregates keep only this many tracks
    pub yearly_top: usize,
    /// how many tracks the CLI prints after building a playlist
    pub print_top: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            yearly_top: 100,
            print_top: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
