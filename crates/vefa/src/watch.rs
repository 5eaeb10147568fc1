//! # Scene Hot-Reload — File Watching
//!
//! [`SceneWatcher`] watches a scene file on disk and reports when it is time
//! to reload it. It never reloads anything itself: the scene polls it once
//! per frame, at the start of [`Scene::update`](crate::scene::Scene::update),
//! so no component ever sees a half-rebuilt graph.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  SceneWatcher                                          │
//! │                                                        │
//! │  watcher ──► background thread (notify crate)          │
//! │              watches the scene file's directory        │
//! │              sends events over mpsc channel            │
//! │                                                        │
//! │  rx ◄──────── receives filesystem events               │
//! │                                                        │
//! │  pending_since ── debounce timestamp for the file      │
//! └────────────────────────────────────────────────────────┘
//!
//! Per-frame: Scene::apply_pending_reload()
//!   1. Poll: drain rx, stamp pending_since on a matching event
//!   2. Debounce: only report once the file was quiet for `debounce`
//!   3. Reload: build the new graph in isolation, swap on success
//! ```
//!
//! ## Debounce
//!
//! Editors often save atomically: write a temporary file, then rename it over
//! the original. That is several events in a few milliseconds, and the file
//! may be incomplete in between. Every event restarts the quiet period; one
//! burst of saves produces exactly one reload.
//!
//! The directory is watched rather than the file, so a rename over the file
//! keeps being noticed.
//!
//! ## Graceful Degradation
//!
//! If the watcher cannot be created (e.g. the inotify limit is reached) the
//! scene keeps running without hot-reload. Errors are logged, not returned.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Default quiet period before a changed file is reloaded.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Hot-reload settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Quiet period after the last filesystem event before reloading.
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Watches one scene file and debounces its change events.
pub struct SceneWatcher {
    /// The filesystem watcher. `None` if initialization failed.
    watcher: Option<RecommendedWatcher>,
    /// Receives filesystem events from the watcher's background thread.
    rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
    /// The watched file, canonicalized when possible.
    path: PathBuf,
    /// Time of the last relevant event not yet reported.
    pending_since: Option<Instant>,
    /// Set once the channel has disconnected (log once, then stop polling).
    rx_disconnected: bool,
    config: WatchConfig,
}

impl SceneWatcher {
    /// Start watching `path`. Never fails: without a working watcher the
    /// result simply never reports a change.
    pub fn new(path: impl AsRef<Path>, config: WatchConfig) -> Self {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let (tx, rx) = mpsc::channel();

        let watcher = notify::recommended_watcher(move |res| {
            // Ignore send errors (receiver dropped).
            let _ = tx.send(res);
        });

        let watcher = match watcher {
            Ok(mut w) => {
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                match w.watch(dir, RecursiveMode::NonRecursive) {
                    Ok(()) => {
                        log::info!("Watching scene '{}' for changes", path.display());
                        Some(w)
                    }
                    Err(e) => {
                        log::warn!("Failed to watch '{}': {e}. Hot-reload disabled.", dir.display());
                        None
                    }
                }
            }
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Hot-reload disabled.");
                None
            }
        };

        Self {
            watcher,
            rx,
            path,
            pending_since: None,
            rx_disconnected: false,
            config,
        }
    }

    /// `false` if the watcher could not be started or has disconnected.
    pub fn is_active(&self) -> bool {
        self.watcher.is_some() && !self.rx_disconnected
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> WatchConfig {
        self.config
    }

    /// Treat the file as changed now, as if an event had arrived.
    pub fn mark_changed(&mut self) {
        self.pending_since = Some(Instant::now());
    }

    /// Drain filesystem events into the debounce timestamp.
    fn poll(&mut self) {
        if self.rx_disconnected {
            return;
        }

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    // Atomic saves show up as create events.
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                        && event.paths.iter().any(|p| self.is_watched(p))
                    {
                        self.pending_since = Some(Instant::now());
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("File watcher error: {e}");
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Hot-reload disabled.");
                    self.rx_disconnected = true;
                    break;
                }
            }
        }
    }

    fn is_watched(&self, path: &Path) -> bool {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        canonical == self.path
    }

    /// `true` once per burst of changes, after the debounce period.
    pub fn reload_ready(&mut self) -> bool {
        self.poll();
        match self.pending_since {
            Some(since) if since.elapsed() >= self.config.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_debounce_is_100ms() {
        assert_eq!(WatchConfig::default().debounce, Duration::from_millis(100));
    }

    #[test]
    fn nothing_pending_is_not_ready() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut watcher = SceneWatcher::new(file.path(), WatchConfig::default());
        assert!(!watcher.reload_ready());
    }

    #[test]
    fn change_is_reported_once_after_debounce() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut watcher = SceneWatcher::new(
            file.path(),
            WatchConfig {
                debounce: Duration::ZERO,
            },
        );

        watcher.mark_changed();
        assert!(watcher.reload_ready());
        assert!(!watcher.reload_ready());
    }

    #[test]
    fn change_waits_for_quiet_period() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut watcher = SceneWatcher::new(
            file.path(),
            WatchConfig {
                debounce: Duration::from_secs(3600),
            },
        );

        watcher.mark_changed();
        assert!(!watcher.reload_ready());
    }

    #[test]
    fn path_is_canonical() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let watcher = SceneWatcher::new(file.path(), WatchConfig::default());
        assert_eq!(watcher.path(), file.path().canonicalize().unwrap());
    }
}
