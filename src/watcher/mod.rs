//! Reload trigger for the outlined file.
//!
//! Editors often save by writing a temporary file and renaming it over the
//! original, so the parent directory is watched and events are matched by
//! path or file name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches one file and reports a change once events have been quiet for
/// the debounce period.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    filter: PathFilter,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target", &self.filter.target_path)
            .field("debounce", &self.debounce)
            .field("pending", &self.pending_since.is_some())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the directory
    /// cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let filter = PathFilter::new(path.as_ref());
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&filter.watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %filter.target_path.display(), "watching file");

        Ok(Self {
            _watcher: watcher,
            rx,
            filter,
            debounce,
            pending_since: None,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.filter.target_path
    }

    /// Drain pending events; `true` once a debounced change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        self.take_change_ready_at(Instant::now())
    }

    fn take_change_ready_at(&mut self, now: Instant) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.filter.matches(&ev) => relevant += 1,
                Ok(ev) => tracing::trace!(kind = ?ev.kind, "ignoring unrelated file event"),
                Err(err) => tracing::warn!(%err, "file watcher error"),
            }
        }
        if relevant > 0 {
            crate::perf::log_event(
                "watcher.change",
                format!("events={relevant} target={}", self.filter.target_path.display()),
            );
            self.pending_since = Some(now);
        }
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct PathFilter {
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
}

impl PathFilter {
    fn new(path: &Path) -> Self {
        // Event paths arrive canonical.
        let target_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let watch_root = target_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            target_name: target_path.file_name().map(std::ffi::OsStr::to_os_string),
            watch_root,
            target_path,
        }
    }

    fn matches(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name() == Some(name.as_os_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event(path: PathBuf) -> Event {
        Event {
            kind: EventKind::Any,
            paths: vec![path],
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_and_rename_events_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# a").unwrap();
        let filter = PathFilter::new(&path);
        let canonical_dir = dir.path().canonicalize().unwrap();

        assert!(filter.matches(&event(canonical_dir.clone())));
        assert!(filter.matches(&event(PathBuf::from("/elsewhere/notes.md"))));
        assert!(!filter.matches(&event(canonical_dir.join("other.md"))));
    }

    #[test]
    fn test_relative_file_watches_current_dir() {
        let filter = PathFilter::new(Path::new("does-not-exist.md"));
        assert_eq!(filter.watch_root, PathBuf::from("."));
    }

    #[test]
    fn test_change_is_debounced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# a").unwrap();
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(200)).unwrap();
        let start = Instant::now();
        watcher.pending_since = Some(start);

        assert!(!watcher.take_change_ready_at(start + Duration::from_millis(100)));
        assert!(watcher.take_change_ready_at(start + Duration::from_millis(250)));
        assert!(!watcher.take_change_ready_at(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap().join("watched.md");
        std::fs::write(&path, "# original").unwrap();
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).unwrap();
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&path, "# modified").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(detected, "watcher should report the modification within 5 seconds");
    }
}
