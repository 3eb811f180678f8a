use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration, loaded once and shared read-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub app: AppConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Origin the dashboard is served from; relative URLs resolve against it
  #[serde(default = "default_origin")]
  pub origin: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      origin: default_origin(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Database name; the file is `<name>.db` inside the data directory
  #[serde(default = "default_store_name")]
  pub name: String,
  /// Override for the data directory (default: $XDG_DATA_HOME/homesync)
  pub data_dir: Option<PathBuf>,
  /// Upper bound on database pages, surfaced as a quota error when reached
  pub max_pages: Option<u32>,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      name: default_store_name(),
      data_dir: None,
      max_pages: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Version tag; bumping it evicts every older cache on activation
  #[serde(default = "default_cache_version")]
  pub version: String,
  #[serde(default = "default_precache")]
  pub precache: Vec<String>,
  /// File extensions (without dot) eligible for runtime caching
  #[serde(default = "default_static_extensions", deserialize_with = "deserialize_extensions")]
  pub static_extensions: Vec<String>,
  /// Path prefixes that bypass the cache entirely (realtime channels)
  #[serde(default = "default_excluded_prefixes")]
  pub excluded_prefixes: Vec<String>,
  #[serde(default = "default_offline_document")]
  pub offline_document: String,
  #[serde(default = "default_fetch_timeout_secs")]
  pub timeout_secs: u64,
  /// Activate a freshly installed version without waiting
  #[serde(default = "default_true")]
  pub skip_waiting: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      version: default_cache_version(),
      precache: default_precache(),
      static_extensions: default_static_extensions(),
      excluded_prefixes: default_excluded_prefixes(),
      offline_document: default_offline_document(),
      timeout_secs: default_fetch_timeout_secs(),
      skip_waiting: true,
    }
  }
}

impl CacheConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Endpoint receiving one POST per pending change
  #[serde(default = "default_sync_endpoint")]
  pub endpoint: String,
  #[serde(default = "default_sync_timeout_secs")]
  pub timeout_secs: u64,
  /// Period of the background sync trigger; 0 disables it
  #[serde(default = "default_sync_interval_secs")]
  pub interval_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      endpoint: default_sync_endpoint(),
      timeout_secs: default_sync_timeout_secs(),
      interval_secs: default_sync_interval_secs(),
    }
  }
}

impl SyncConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn interval(&self) -> Option<Duration> {
    (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
  }
}

fn default_origin() -> String {
  "http://localhost:3000".to_string()
}

fn default_store_name() -> String {
  "family_dashboard_offline".to_string()
}

fn default_cache_version() -> String {
  "family-dashboard-v1".to_string()
}

fn default_precache() -> Vec<String> {
  ["/", "/index.html", "/offline.html", "/manifest.json"]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_static_extensions() -> Vec<String> {
  [
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "ttf", "json",
    "webmanifest",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

fn default_excluded_prefixes() -> Vec<String> {
  vec!["/socket.io".to_string(), "/ws".to_string()]
}

fn default_offline_document() -> String {
  "/offline.html".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
  10
}

fn default_sync_endpoint() -> String {
  "http://localhost:3000/api/sync".to_string()
}

fn default_sync_timeout_secs() -> u64 {
  15
}

fn default_sync_interval_secs() -> u64 {
  300
}

fn default_true() -> bool {
  true
}

/// Accept `.js` and `js` alike, compare case-insensitively.
fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(
    v.into_iter()
      .map(|s| s.trim_start_matches('.').to_lowercase())
      .collect(),
  )
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./homesync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/homesync/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("homesync.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("homesync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Directory holding the databases and log files.
  pub fn data_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.store.data_dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("homesync"))
  }
}
