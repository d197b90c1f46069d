//! Desktop wallpaper thumbnails
//!
//! Decodes each screen's wallpaper into a small RGBA thumbnail off the
//! owner thread and keeps the most recently used ones in a
//! [`ResourceCache`]. Panels draw the thumbnail (blurred, scaled to fill)
//! behind their content.

pub mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::cache::{CacheError, InvalidationSink, Lookup, ResourceCache, Ticket};
use crate::config::PanelKitConfig;

use watcher::canonical;

pub use watcher::{InvalidationEvent, WallpaperWatcher};

/// Longest thumbnail side used when none is configured
pub const DEFAULT_MAX_PIXEL_SIZE: u32 = 480;

/// A decoded, downsampled wallpaper
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// RGBA pixel data (4 bytes per pixel)
    pub pixels: Vec<u8>,
    /// Thumbnail width in pixels
    pub width: u32,
    /// Thumbnail height in pixels
    pub height: u32,
    /// Width of the source image, after orientation
    pub source_width: u32,
    /// Height of the source image, after orientation
    pub source_height: u32,
    /// Image format name (e.g. "PNG", "JPEG")
    pub format: String,
}

impl Thumbnail {
    /// Size of the pixel buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Decode an image file into a thumbnail.
///
/// EXIF orientation is applied first. The longest side is then reduced to
/// at most `max_pixel_size`; smaller images are never upscaled.
pub fn load_thumbnail(path: &Path, max_pixel_size: u32) -> anyhow::Result<Thumbnail> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to read {}", path.display()))?;

    let format = reader
        .format()
        .map(|f| format!("{:?}", f).to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let mut decoder = reader
        .into_decoder()
        .with_context(|| format!("unsupported image {}", path.display()))?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    image.apply_orientation(orientation);

    let (source_width, source_height) = (image.width(), image.height());
    let max_pixel_size = max_pixel_size.max(1);
    if source_width.max(source_height) > max_pixel_size {
        image = image.thumbnail(max_pixel_size, max_pixel_size);
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    tracing::debug!(
        path = %path.display(),
        source = %format!("{}x{}", source_width, source_height),
        thumbnail = %format!("{}x{}", width, height),
        "decoded wallpaper thumbnail"
    );

    Ok(Thumbnail {
        pixels: rgba.into_raw(),
        width,
        height,
        source_width,
        source_height,
        format,
    })
}

/// Tells the service which wallpaper each screen currently shows
pub trait DesktopSource {
    /// One wallpaper path per screen, for the active workspace
    fn wallpaper_paths(&self) -> Vec<PathBuf>;
}

/// A fixed set of wallpapers
#[derive(Debug, Clone, Default)]
pub struct StaticDesktop {
    paths: Vec<PathBuf>,
}

impl StaticDesktop {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn set_paths(&mut self, paths: Vec<PathBuf>) {
        self.paths = paths;
    }
}

impl DesktopSource for StaticDesktop {
    fn wallpaper_paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }
}

/// Fetches and caches wallpaper thumbnails for every screen.
///
/// Entries are keyed by canonical path, the same form watcher events
/// carry, so a wallpaper reached through a symlinked directory is still
/// matched by its change events.
pub struct WallpaperService<S> {
    source: S,
    cache: ResourceCache<PathBuf, Arc<Thumbnail>>,
    max_pixel_size: u32,
}

impl<S: DesktopSource> WallpaperService<S> {
    pub fn new(source: S, capacity: usize, max_pixel_size: u32) -> Self {
        Self {
            source,
            cache: ResourceCache::new(capacity),
            max_pixel_size,
        }
    }

    pub fn from_config(source: S, config: &PanelKitConfig) -> Self {
        Self::new(
            source,
            config.cache_capacity,
            config.thumbnail_max_pixel_size,
        )
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn cache(&self) -> &ResourceCache<PathBuf, Arc<Thumbnail>> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache<PathBuf, Arc<Thumbnail>> {
        &mut self.cache
    }

    /// Start loading every screen's wallpaper that is neither cached nor
    /// already loading. Returns the number of fetches started.
    pub fn refresh(&mut self) -> usize {
        let mut started = 0;
        for path in self.source.wallpaper_paths() {
            let key = canonical(&path);
            let loader = thumbnail_loader(key.clone(), self.max_pixel_size);
            if self.cache.prefetch(key, loader) {
                started += 1;
            }
        }
        if started > 0 {
            tracing::debug!(started, "refreshing wallpapers");
        }
        started
    }

    /// Cached thumbnail for `path`, if loaded
    pub fn wallpaper(&mut self, path: &Path) -> Option<Arc<Thumbnail>> {
        self.cache.get(&canonical(path))
    }

    /// Cached thumbnails for the screens that have one, in screen order
    pub fn current_wallpapers(&mut self) -> Vec<(PathBuf, Arc<Thumbnail>)> {
        self.source
            .wallpaper_paths()
            .into_iter()
            .filter_map(|path| {
                let thumbnail = self.cache.get(&canonical(&path))?;
                Some((path, thumbnail))
            })
            .collect()
    }

    /// Cached thumbnail or a ticket for the (single) in-flight load
    pub fn request(&mut self, path: &Path) -> Lookup<Arc<Thumbnail>> {
        let key = canonical(path);
        let loader = thumbnail_loader(key.clone(), self.max_pixel_size);
        self.cache.request(key, loader)
    }

    /// Apply finished loads without blocking
    pub fn poll(&mut self) -> usize {
        self.cache.poll()
    }

    pub fn wait(
        &mut self,
        ticket: &Ticket<Arc<Thumbnail>>,
        timeout: Duration,
    ) -> Result<Arc<Thumbnail>, CacheError> {
        self.cache.wait(ticket, timeout)
    }

    /// Block until every started load has been applied
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        self.cache.wait_idle(timeout)
    }

    /// React to watcher events, then reload what the screens now show.
    ///
    /// A change to a cached wallpaper drops just that entry. A change to
    /// anything else (the desktop's picture database) may have switched any
    /// screen's wallpaper, so everything is invalidated.
    pub fn apply_invalidations(&mut self, events: &[InvalidationEvent]) -> usize {
        if events.is_empty() {
            return 0;
        }

        for event in events {
            let path = canonical(event.path());
            if self.cache.contains(&path) || self.cache.is_in_flight(&path) {
                self.cache.on_invalidate(&path);
            } else {
                self.cache.invalidate_all();
            }
        }
        self.refresh()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for WallpaperService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallpaperService")
            .field("source", &self.source)
            .field("cache", &self.cache)
            .field("max_pixel_size", &self.max_pixel_size)
            .finish()
    }
}

fn thumbnail_loader(
    path: PathBuf,
    max_pixel_size: u32,
) -> impl FnOnce() -> anyhow::Result<Arc<Thumbnail>> + Send + 'static {
    move || load_thumbnail(&path, max_pixel_size).map(Arc::new)
}
