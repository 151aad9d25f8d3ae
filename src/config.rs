//! Configuration management with YAML support

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::inspect::panel::{DEFAULT_CONFIRM_THRESHOLD, DEFAULT_UNDO_WINDOW_SECS};
use crate::inspect::{SortDirection, SortKey};
use crate::tracker::DEFAULT_INSTANCE_TTL_DAYS;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Durable store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Simulated browser state file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Network counters carried between runs
    #[serde(default = "default_network_state_path")]
    pub network_state_path: String,
}

/// Age tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_instance_ttl_days")]
    pub instance_ttl_days: i64,
}

/// Inspector panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Bulk closes larger than this ask for confirmation
    #[serde(default = "default_confirm_threshold")]
    pub confirm_close_threshold: usize,

    #[serde(default = "default_undo_window_secs")]
    pub undo_window_secs: i64,

    #[serde(default)]
    pub default_sort: SortKey,

    #[serde(default)]
    pub default_direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_store_path() -> String {
    "~/.local/share/autopsy/autopsy.db".to_string()
}

fn default_state_path() -> String {
    "~/.local/share/autopsy/browser.json".to_string()
}

fn default_network_state_path() -> String {
    "~/.local/share/autopsy/network.json".to_string()
}

fn default_instance_ttl_days() -> i64 {
    DEFAULT_INSTANCE_TTL_DAYS
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_confirm_threshold() -> usize {
    DEFAULT_CONFIRM_THRESHOLD
}

fn default_undo_window_secs() -> i64 {
    DEFAULT_UNDO_WINDOW_SECS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            network_state_path: default_network_state_path(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            instance_ttl_days: default_instance_ttl_days(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            confirm_close_threshold: default_confirm_threshold(),
            undo_window_secs: default_undo_window_secs(),
            default_sort: SortKey::default(),
            default_direction: SortDirection::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./autopsy.yaml (current directory)
    /// 3. ~/.config/autopsy/autopsy.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "autopsy.yaml".to_string(),
            shellexpand::tilde("~/.config/autopsy/autopsy.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("reading config {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("parsing config {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the store path, expanding ~ to home directory
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).to_string())
    }

    /// Get the browser state file path, expanding ~ to home directory
    pub fn browser_state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.browser.state_path).to_string())
    }

    pub fn network_state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.browser.network_state_path).to_string())
    }

    pub fn instance_ttl(&self) -> Duration {
        Duration::days(self.tracking.instance_ttl_days.max(1))
    }

    pub fn undo_window(&self) -> Duration {
        Duration::seconds(self.panel.undo_window_secs.max(0))
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.panel.refresh_interval_secs.max(1))
    }
}
