//! Live filesystem watcher (§4.5 "Expansion — watcher implementation"):
//! `notify` forwards raw events across a channel; a per-path debounce table
//! coalesces `add`/`change` bursts into one `indexFile` call every 500 ms.
//! `remove` events bypass the table entirely.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use recall_extract::Language;

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::walker::DEFAULT_IGNORES;

pub struct WatcherBatch {
    pub changed: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

pub fn path_is_ignored(path: &Path) -> bool {
    path.components().any(|c| DEFAULT_IGNORES.iter().any(|ignored| c.as_os_str() == *ignored))
}

fn is_watchable(path: &Path) -> bool {
    if path_is_ignored(path) {
        return false;
    }
    path.to_str().map(|s| Language::from_path(s).is_some()).unwrap_or(false)
}

pub struct ProjectWatcher {
    // Held only to keep the OS watch alive; never read directly.
    _inner: RecommendedWatcher,
    events_rx: Receiver<notify::Result<Event>>,
    debouncer: Debouncer,
}

impl ProjectWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, events_rx) = crossbeam_channel::unbounded();
        let mut inner = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        inner.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _inner: inner,
            events_rx,
            debouncer: Debouncer::new(),
        })
    }

    /// Drains raw events for up to `poll_for`, then returns every path
    /// whose debounce window has elapsed plus any `remove` events seen
    /// during the poll. A zero-duration poll just checks the debounce
    /// table without blocking on new events.
    pub fn tick(&mut self, poll_for: Duration) -> WatcherBatch {
        let deadline = Instant::now() + poll_for;
        let mut removed = Vec::new();

        while let Ok(Ok(event)) = self.events_rx.recv_deadline(deadline) {
            for path in event.paths {
                if !is_watchable(&path) {
                    continue;
                }
                match event.kind {
                    EventKind::Remove(_) => removed.push(path),
                    EventKind::Create(_) | EventKind::Modify(_) => self.debouncer.touch(path),
                    _ => {}
                }
            }
        }

        WatcherBatch {
            changed: self.debouncer.ready(Instant::now()),
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_directories_are_filtered() {
        assert!(path_is_ignored(Path::new("/repo/node_modules/lib.js")));
        assert!(!path_is_ignored(Path::new("/repo/src/lib.rs")));
    }

    #[test]
    fn unsupported_extensions_are_filtered() {
        assert!(!is_watchable(Path::new("/repo/README.md")));
        assert!(is_watchable(Path::new("/repo/src/lib.rs")));
    }
}
