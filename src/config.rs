//! Library configuration persistence
//!
//! Stores preferences in `~/.config/panelkit/config.yaml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::panel::{PanelConfiguration, Presentation, TransitionTiming};
use crate::wallpaper::watcher::DEFAULT_DEBOUNCE;
use crate::wallpaper::DEFAULT_MAX_PIXEL_SIZE;

/// Configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelKitConfig {
    /// Number of wallpaper thumbnails kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Longest side of a decoded wallpaper thumbnail, in pixels
    #[serde(default = "default_thumbnail_max_pixel_size")]
    pub thumbnail_max_pixel_size: u32,

    /// Debounce window for wallpaper file changes
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,

    /// Enter transition timing
    #[serde(default)]
    pub enter: TransitionTiming,

    /// Exit transition timing
    #[serde(default)]
    pub exit: TransitionTiming,

    /// Window-system flags for panels built from this config
    #[serde(default)]
    pub configuration: PanelConfiguration,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_thumbnail_max_pixel_size() -> u32 {
    DEFAULT_MAX_PIXEL_SIZE
}

fn default_watch_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for PanelKitConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            thumbnail_max_pixel_size: default_thumbnail_max_pixel_size(),
            watch_debounce_ms: default_watch_debounce_ms(),
            enter: TransitionTiming::default(),
            exit: TransitionTiming::default(),
            configuration: PanelConfiguration::default(),
        }
    }
}

impl PanelKitConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load settings from `path`.
    ///
    /// A missing file is the normal first-run case. An unreadable or
    /// malformed one is reported and ignored. Either way the defaults are
    /// used.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::parse(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring config: {:#}", e);
                Self::default()
            }
        }
    }

    fn parse(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path).context("failed to read")?;
        serde_yaml::from_str(&text).context("failed to parse")
    }

    /// Save config to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| anyhow::anyhow!("No config directory available"))?;
        self.save_to(&path)
    }

    /// Save config to a specific file
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Fade presentation using the configured timings
    pub fn presentation(&self) -> Presentation {
        Presentation::fade(self.enter, self.exit)
    }

    pub fn watch_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.watch_debounce_ms)
    }
}
