//! Command-line argument parsing for the panel simulator
//!
//! Supports:
//! - Choosing sizing/position strategies and the simulated screen
//! - Running several present/dismiss cycles
//! - Warming the wallpaper thumbnail cache and watching it for changes

use clap::Parser;
use std::path::PathBuf;

use crate::config::PanelKitConfig;
use crate::geometry::{parse_size, PositionStrategy, Size, SizingStrategy};

/// Headless overlay panel simulator
#[derive(Parser, Debug)]
#[command(
    name = "panelkit",
    version,
    about = "Simulate overlay panel presentation without a window system"
)]
pub struct CliArgs {
    /// Wallpaper images to decode into thumbnails (one per simulated screen)
    #[arg(value_name = "WALLPAPERS")]
    pub wallpapers: Vec<PathBuf>,

    /// Sizing strategy: full, fixed:WxH, adapt[:WxH]
    #[arg(long, default_value = "adapt")]
    pub sizing: SizingStrategy,

    /// Position strategy: center, top[:N], bottom[:N], abs:X,Y, ignore
    #[arg(long, default_value = "center")]
    pub position: PositionStrategy,

    /// Use the full-screen immersive style (overrides --sizing/--position)
    #[arg(long)]
    pub immersive: bool,

    /// Simulated screen size
    #[arg(long, default_value = "1440x900", value_parser = parse_size)]
    pub screen: Size,

    /// Simulated measured content size
    #[arg(long, default_value = "640x400", value_parser = parse_size)]
    pub content: Size,

    /// Number of present/dismiss cycles to run
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,

    /// Thumbnail cache capacity (overrides config)
    #[arg(long, value_name = "N")]
    pub capacity: Option<usize>,

    /// Longest thumbnail side in pixels (overrides config)
    #[arg(long, value_name = "PX")]
    pub max_pixel_size: Option<u32>,

    /// Keep watching the wallpapers for changes for this many seconds
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Load the config file and apply command-line overrides
    pub fn resolve_config(&self) -> PanelKitConfig {
        let mut config = match &self.config {
            Some(path) => PanelKitConfig::load_from(path),
            None => PanelKitConfig::load(),
        };

        if let Some(capacity) = self.capacity {
            config.cache_capacity = capacity;
        }
        if let Some(max_pixel_size) = self.max_pixel_size {
            config.thumbnail_max_pixel_size = max_pixel_size;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["panelkit"]);
        assert_eq!(
            args.sizing,
            SizingStrategy::Adapting {
                max_width: None,
                max_height: None
            }
        );
        assert_eq!(args.position, PositionStrategy::Center);
        assert_eq!(args.screen, Size::new(1440.0, 900.0));
        assert_eq!(args.cycles, 1);
        assert!(args.wallpapers.is_empty());
    }

    #[test]
    fn test_strategies_and_wallpapers() {
        let args = CliArgs::parse_from([
            "panelkit",
            "--sizing",
            "fixed:200x100",
            "--position",
            "top:24",
            "--screen",
            "1920x1080",
            "a.png",
            "b.jpg",
        ]);
        assert_eq!(
            args.sizing,
            SizingStrategy::Fixed {
                width: 200.0,
                height: 100.0
            }
        );
        assert_eq!(args.position, PositionStrategy::Top(24.0));
        assert_eq!(args.screen, Size::new(1920.0, 1080.0));
        assert_eq!(args.wallpapers.len(), 2);
    }

    #[test]
    fn test_invalid_sizing_is_rejected() {
        let result = CliArgs::try_parse_from(["panelkit", "--sizing", "huge"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("config.yaml");
        let args = CliArgs::parse_from([
            "panelkit",
            "--capacity",
            "2",
            "--max-pixel-size",
            "64",
            "--config",
            missing.to_str().unwrap(),
        ]);

        let config = args.resolve_config();
        assert_eq!(config.cache_capacity, 2);
        assert_eq!(config.thumbnail_max_pixel_size, 64);
    }
}
