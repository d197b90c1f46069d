//! panelkit - overlay panels with managed presentation
//!
//! This crate provides the pieces an application needs to show a floating
//! or full-screen overlay panel above other windows:
//!
//! - [`geometry`]: frame computation from sizing and position strategies
//! - [`panel`]: the presentation lifecycle, driven by a [`PanelController`]
//!   over any [`panel::PanelWindow`] backend
//! - [`cache`]: a bounded, single-flight cache for expensive resources
//! - [`wallpaper`]: desktop wallpaper thumbnails built on that cache

pub mod cache;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod geometry;
pub mod panel;
pub mod tracing;
pub mod wallpaper;

// Re-export commonly used types
pub use cache::{CacheError, InvalidationSink, Lookup, ResourceCache};
pub use config::PanelKitConfig;
pub use geometry::{PositionStrategy, Rect, Size, SizingStrategy};
pub use panel::{PanelController, PanelError, PanelState};
pub use wallpaper::{WallpaperService, WallpaperWatcher};
