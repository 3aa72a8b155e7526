//! YAML configuration and environment lookups.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Base URL request paths are resolved against, e.g. https://vhc.example.com
  pub base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Override for the cache database location
  pub path: Option<PathBuf>,
  /// Keep the cache in memory only
  #[serde(default)]
  pub ephemeral: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Endpoint probed while offline to detect reconnection
  #[serde(default = "default_health_path")]
  pub health_path: String,
  #[serde(default = "default_probe_interval_secs")]
  pub probe_interval_secs: u64,
  /// Server rejections tolerated before a queued operation is discarded
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
}

fn default_health_path() -> String {
  "/api/health".to_string()
}

fn default_probe_interval_secs() -> u64 {
  30
}

fn default_max_attempts() -> u32 {
  5
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      health_path: default_health_path(),
      probe_interval_secs: default_probe_interval_secs(),
      max_attempts: default_max_attempts(),
    }
  }
}

impl SyncConfig {
  pub fn probe_interval(&self) -> Duration {
    Duration::from_secs(self.probe_interval_secs.max(1))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vhc.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vhc/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/vhc/config.yaml\n\
                 with at least `api.base_url` set."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("vhc.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vhc").join("config.yaml");
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

  /// Get the session cookie value from the environment.
  ///
  /// Checks VHC_SESSION_COOKIE. Without it requests go out unauthenticated.
  pub fn get_session_cookie() -> Option<String> {
    std::env::var("VHC_SESSION_COOKIE")
      .ok()
      .filter(|s| !s.is_empty())
  }
}
