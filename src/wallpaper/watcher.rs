//! File system watching for wallpaper invalidation
//!
//! Uses the `notify` crate with debouncing to detect when a wallpaper image,
//! or the database the desktop stores its picture settings in, changes.
//! Each watched file's parent directory is watched so atomic replacements
//! (write to temp, rename over) are seen too.

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// Debounce window used when none is configured
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Events emitted by the wallpaper watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationEvent {
    /// A watched file was created, modified, replaced or deleted
    Changed(PathBuf),
}

impl InvalidationEvent {
    pub fn path(&self) -> &Path {
        match self {
            InvalidationEvent::Changed(path) => path,
        }
    }
}

/// Watches a fixed set of files with debouncing
pub struct WallpaperWatcher {
    /// The debouncer handles watching and event coalescing
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    /// Receiver for debounced events
    rx: Receiver<Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>,
    /// Files being watched (canonicalized where possible)
    files: HashSet<PathBuf>,
}

impl WallpaperWatcher {
    /// Start watching `files`.
    ///
    /// Fails if any parent directory cannot be watched (e.g. it does not
    /// exist, or sandboxing forbids it).
    pub fn new(files: &[PathBuf], debounce: Duration) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(debounce, tx)?;

        let files: HashSet<PathBuf> = files.iter().map(|path| canonical(path)).collect();
        let dirs: HashSet<&Path> = files.iter().filter_map(|path| path.parent()).collect();

        for dir in &dirs {
            debouncer
                .watcher()
                .watch(dir, notify::RecursiveMode::NonRecursive)?;
        }

        tracing::info!(
            files = files.len(),
            dirs = dirs.len(),
            "Started wallpaper watcher"
        );

        Ok(Self {
            _debouncer: debouncer,
            rx,
            files,
        })
    }

    /// Files being watched
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Poll for pending invalidations (non-blocking)
    ///
    /// Events for files in the same directories that are not watched are
    /// dropped. Each path is reported at most once per poll.
    pub fn poll_events(&self) -> Vec<InvalidationEvent> {
        let mut events = Vec::new();

        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(debounced_events) => {
                    for event in debounced_events {
                        if matches!(event.kind, DebouncedEventKind::AnyContinuous) {
                            // Still changing; the final Any event follows.
                            continue;
                        }
                        if !self.is_watched(&event.path) {
                            continue;
                        }

                        let invalidation = InvalidationEvent::Changed(canonical(&event.path));
                        if !events.contains(&invalidation) {
                            events.push(invalidation);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Wallpaper watcher error: {:?}", e);
                }
            }
        }

        if !events.is_empty() {
            tracing::debug!("Wallpaper watcher detected {} changes", events.len());
        }

        events
    }

    fn is_watched(&self, path: &Path) -> bool {
        self.files.contains(path) || self.files.contains(&canonical(path))
    }
}

impl std::fmt::Debug for WallpaperWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallpaperWatcher")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

/// Canonicalize when the path exists; deleted files keep their given path
pub(crate) fn canonical(path: &Path) -> PathBuf {
    match path.parent().map(std::fs::canonicalize) {
        Some(Ok(dir)) => match path.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        },
        _ => path.to_path_buf(),
    }
}
