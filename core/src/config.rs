//! Configuration persistence for favorites, watched ports and settings.
//!
//! Stored as JSON at `~/.portwarden/config.json` and written atomically
//! (temp file, then rename) so a crash mid-save never corrupts it.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::WatchedPort;
use crate::error::{Error, Result};

/// Persisted configuration data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Favorite port numbers.
    #[serde(default)]
    pub favorites: Vec<u16>,

    /// Watched ports with notification settings.
    #[serde(default)]
    pub watched_ports: Vec<WatchedPort>,

    /// Port scan refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Whether inactive placeholder records are shown in listings.
    #[serde(default = "default_true")]
    pub show_inactive: bool,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            watched_ports: Vec::new(),
            refresh_interval: default_refresh_interval(),
            show_inactive: true,
        }
    }
}

/// Configuration store backed by a single JSON file.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a store at the default path, `~/.portwarden/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portwarden").join("config.json"),
        })
    }

    /// Create a store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load configuration from disk; a missing file yields defaults.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to disk, creating the directory if needed.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write to a temp file, sync, then rename over the real one.
        let temp_path = self.config_path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.config_path).await?;

        Ok(())
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Get the set of favorite ports.
    pub async fn get_favorites(&self) -> Result<HashSet<u16>> {
        let config = self.load().await?;
        Ok(config.favorites.into_iter().collect())
    }

    /// Add a port to favorites.
    pub async fn add_favorite(&self, port: u16) -> Result<()> {
        let mut config = self.load().await?;
        if !config.favorites.contains(&port) {
            config.favorites.push(port);
            config.favorites.sort_unstable();
            self.save(&config).await?;
        }
        Ok(())
    }

    /// Remove a port from favorites.
    pub async fn remove_favorite(&self, port: u16) -> Result<()> {
        let mut config = self.load().await?;
        config.favorites.retain(|&p| p != port);
        self.save(&config).await
    }

    // =========================================================================
    // Watched ports
    // =========================================================================

    /// Get the list of watched ports.
    pub async fn get_watched_ports(&self) -> Result<Vec<WatchedPort>> {
        Ok(self.load().await?.watched_ports)
    }

    /// Add a watched port with the given notification settings.
    pub async fn add_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<WatchedPort> {
        let mut config = self.load().await?;

        if config.watched_ports.iter().any(|w| w.port == port) {
            return Err(Error::Config(format!(
                "Port {} is already being watched",
                port
            )));
        }

        let spec = WatchedPort::with_notifications(port, notify_on_start, notify_on_stop);
        config.watched_ports.push(spec.clone());
        self.save(&config).await?;

        Ok(spec)
    }

    /// Remove a watched port by port number.
    pub async fn remove_watched_port(&self, port: u16) -> Result<()> {
        let mut config = self.load().await?;
        config.watched_ports.retain(|w| w.port != port);
        self.save(&config).await
    }

    /// Update notification settings for a watched port.
    pub async fn update_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<()> {
        let mut config = self.load().await?;

        let Some(spec) = config.watched_ports.iter_mut().find(|w| w.port == port) else {
            return Err(Error::Config(format!("Port {} is not being watched", port)));
        };

        spec.notify_on_start = notify_on_start;
        spec.notify_on_stop = notify_on_stop;
        self.save(&config).await
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Get the refresh interval in seconds.
    pub async fn get_refresh_interval(&self) -> Result<u64> {
        Ok(self.load().await?.refresh_interval)
    }

    /// Set the refresh interval in seconds.
    pub async fn set_refresh_interval(&self, interval: u64) -> Result<()> {
        let mut config = self.load().await?;
        config.refresh_interval = interval;
        self.save(&config).await
    }

    /// Get the show-inactive view flag.
    pub async fn get_show_inactive(&self) -> Result<bool> {
        Ok(self.load().await?.show_inactive)
    }

    /// Set the show-inactive view flag.
    pub async fn set_show_inactive(&self, enabled: bool) -> Result<()> {
        let mut config = self.load().await?;
        config.show_inactive = enabled;
        self.save(&config).await
    }
}
